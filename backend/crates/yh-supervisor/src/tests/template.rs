use crate::CommandTemplateEngine;

use googletest::assert_that;
use googletest::prelude::{eq, len};
use url::Url;
use yh_config::TemplateParams;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn params(pairs: &[(&str, &str)]) -> TemplateParams {
    pairs.iter().copied().collect()
}

// =========================================================================
// Port Derivation
// =========================================================================

#[test]
fn given_explicit_port_when_derive_port_then_uses_it() {
    assert_that!(
        CommandTemplateEngine::derive_port(&url("http://localhost:5173")),
        eq(5173_u16)
    );
}

#[test]
fn given_https_without_port_when_derive_port_then_443() {
    assert_that!(
        CommandTemplateEngine::derive_port(&url("https://example.com/app")),
        eq(443_u16)
    );
}

#[test]
fn given_http_without_port_when_derive_port_then_80() {
    assert_that!(
        CommandTemplateEngine::derive_port(&url("http://example.com")),
        eq(80_u16)
    );
}

#[test]
fn given_https_with_default_port_spelled_out_when_derive_port_then_443() {
    // The URL parser normalizes ":443" away for https
    assert_that!(
        CommandTemplateEngine::derive_port(&url("https://example.com:443")),
        eq(443_u16)
    );
}

// =========================================================================
// Expansion
// =========================================================================

#[test]
fn given_port_and_env_placeholders_when_expand_then_both_substituted() {
    let expansion = CommandTemplateEngine::expand(
        "serve --port [port] --env [env]",
        &params(&[("env", "prod")]),
        &url("http://localhost:9000"),
    );

    assert_that!(expansion.command, eq("serve --port 9000 --env prod"));
    assert!(expansion.is_fully_resolved());
}

#[test]
fn given_missing_param_and_no_params_when_expand_then_reported() {
    let expansion =
        CommandTemplateEngine::expand("run [missing]", &TemplateParams::new(), &url("http://localhost"));

    assert_that!(expansion.command, eq("run [missing]"));
    assert_eq!(expansion.unresolved, vec!["[missing]".to_string()]);
}

#[test]
fn given_port_placeholder_when_expand_then_substitutes_url_port() {
    // Given
    let template = "npm run dev -- --port [port]";

    // When
    let expansion =
        CommandTemplateEngine::expand(template, &TemplateParams::new(), &url("http://localhost:3000"));

    // Then
    assert_that!(expansion.command, eq("npm run dev -- --port 3000"));
    assert!(expansion.is_fully_resolved());
}

#[test]
fn given_explicit_port_param_when_expand_then_param_wins_over_url() {
    let expansion = CommandTemplateEngine::expand(
        "serve -p [port]",
        &params(&[("port", "8080")]),
        &url("http://localhost:3000"),
    );

    assert_that!(expansion.command, eq("serve -p 8080"));
}

#[test]
fn given_https_url_without_port_when_expand_then_port_is_443() {
    let expansion = CommandTemplateEngine::expand(
        "serve --port [port]",
        &TemplateParams::new(),
        &url("https://site.test"),
    );

    assert_that!(expansion.command, eq("serve --port 443"));
}

#[test]
fn given_repeated_placeholders_when_expand_then_every_occurrence_replaced() {
    let expansion = CommandTemplateEngine::expand(
        "run [env] --mode [env] --port [port] --hmr [port]",
        &params(&[("env", "prod")]),
        &url("http://localhost:4000"),
    );

    assert_that!(
        expansion.command,
        eq("run prod --mode prod --port 4000 --hmr 4000")
    );
}

#[test]
fn given_unknown_placeholder_when_expand_then_left_verbatim_and_reported() {
    // Given
    let template = "serve --token [token] --port [port]";

    // When
    let expansion =
        CommandTemplateEngine::expand(template, &TemplateParams::new(), &url("http://localhost:1234"));

    // Then
    assert_that!(expansion.command, eq("serve --token [token] --port 1234"));
    assert_eq!(expansion.unresolved, vec!["[token]".to_string()]);
}

#[test]
fn given_unknown_placeholder_repeated_when_expand_then_reported_once_in_order() {
    let expansion = CommandTemplateEngine::expand(
        "[b] [a] [b] [a]",
        &TemplateParams::new(),
        &url("http://localhost"),
    );

    assert_that!(expansion.unresolved, len(eq(2)));
    assert_eq!(expansion.unresolved, vec!["[b]".to_string(), "[a]".to_string()]);
}

#[test]
fn given_key_that_is_prefix_of_another_when_expand_then_only_whole_tokens_match() {
    let expansion = CommandTemplateEngine::expand(
        "[api] [api_key]",
        &params(&[("api", "A"), ("api_key", "K")]),
        &url("http://localhost"),
    );

    assert_that!(expansion.command, eq("A K"));
}

#[test]
fn given_value_containing_placeholder_syntax_when_expand_then_value_is_not_rescanned() {
    let expansion = CommandTemplateEngine::expand(
        "echo [greeting]",
        &params(&[("greeting", "[port]")]),
        &url("http://localhost:9000"),
    );

    assert_that!(expansion.command, eq("echo [port]"));
    assert!(expansion.is_fully_resolved());
}

#[test]
fn given_brackets_around_non_identifier_when_expand_then_untouched_and_not_reported() {
    let expansion = CommandTemplateEngine::expand(
        "cmd [a-b] [ ] []",
        &TemplateParams::new(),
        &url("http://localhost"),
    );

    assert_that!(expansion.command, eq("cmd [a-b] [ ] []"));
    assert!(expansion.is_fully_resolved());
}

#[test]
fn given_template_without_placeholders_when_expand_then_unchanged() {
    let expansion = CommandTemplateEngine::expand(
        "python -m http.server",
        &params(&[("unused", "x")]),
        &url("http://localhost:8000"),
    );

    assert_that!(expansion.command, eq("python -m http.server"));
    assert!(expansion.is_fully_resolved());
}

// =========================================================================
// Bindings
// =========================================================================

#[test]
fn given_params_without_port_when_bindings_then_port_is_added() {
    let bindings =
        CommandTemplateEngine::bindings(&params(&[("env", "dev")]), &url("http://localhost:7000"));

    assert_eq!(bindings.get("port"), Some("7000"));
    assert_eq!(bindings.get("env"), Some("dev"));
}

#[test]
fn given_params_with_port_when_bindings_then_port_is_kept() {
    let bindings =
        CommandTemplateEngine::bindings(&params(&[("port", "1")]), &url("http://localhost:7000"));

    assert_eq!(bindings.get("port"), Some("1"));
    assert_that!(bindings.len(), eq(1_usize));
}
