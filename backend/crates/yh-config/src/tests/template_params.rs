use crate::TemplateParams;

use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_pairs_when_collect_then_lookup_by_key() {
    let params: TemplateParams = [("env", "prod"), ("token", "t0k")].into_iter().collect();

    assert_eq!(params.get("env"), Some("prod"));
    assert_eq!(params.get("token"), Some("t0k"));
    assert!(params.get("missing").is_none());
    assert_that!(params.len(), eq(2_usize));
}

#[test]
fn given_null_when_deserialize_then_empty() {
    let params: TemplateParams = serde_json::from_str("null").unwrap();

    assert!(params.is_empty());
}

#[test]
fn given_array_value_when_deserialize_then_error_names_key() {
    let result: Result<TemplateParams, _> = serde_json::from_str(r#"{"hosts": ["a", "b"]}"#);

    let message = result.unwrap_err().to_string();
    assert!(message.contains("hosts"));
}

#[test]
fn given_params_when_serialize_then_plain_string_map() {
    let mut params = TemplateParams::new();
    params.insert("port", "3000");

    let json = serde_json::to_string(&params).unwrap();

    assert_that!(json, eq(r#"{"port":"3000"}"#));
}
