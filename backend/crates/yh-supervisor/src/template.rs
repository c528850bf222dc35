//! Placeholder expansion for the server start command.

use crate::{HTTP_DEFAULT_PORT, HTTPS_DEFAULT_PORT, HTTPS_SCHEME, PORT_PLACEHOLDER};

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};
use url::Url;
use yh_config::TemplateParams;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)\]").expect("placeholder pattern is a valid regex"));

/// An expanded command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub command: String,
    /// Placeholder tokens (with brackets) that had no binding, in order of
    /// first appearance.
    pub unresolved: Vec<String>,
}

impl Expansion {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

pub struct CommandTemplateEngine;

impl CommandTemplateEngine {
    /// Expand `[name]` placeholders in `template`.
    ///
    /// Algorithm:
    /// 1. Start from `params`; if it has no `port` key, bind `port` to the
    ///    port implied by `url`
    /// 2. Replace every bracketed identifier that has a binding, in a single
    ///    pass so substituted values are never rescanned
    /// 3. Leave unbound tokens verbatim and report them in `unresolved`
    pub fn expand(template: &str, params: &TemplateParams, url: &Url) -> Expansion {
        let bindings = Self::bindings(params, url);
        let mut unresolved: Vec<String> = Vec::new();

        let command = PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match bindings.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => {
                    let token = caps[0].to_string();
                    if !unresolved.contains(&token) {
                        unresolved.push(token.clone());
                    }
                    token
                }
            })
            .into_owned();

        for (key, _) in params.iter() {
            if !Self::is_identifier(key) {
                warn!("Template parameter '{key}' is not an identifier and never matches");
            }
        }

        if unresolved.is_empty() {
            debug!("Expanded command: {command}");
        } else {
            warn!("Unresolved placeholders in command: {unresolved:?}");
        }

        Expansion {
            command,
            unresolved,
        }
    }

    /// Port implied by a URL: explicit port, else 443 for https, else 80.
    pub fn derive_port(url: &Url) -> u16 {
        url.port().unwrap_or(if url.scheme() == HTTPS_SCHEME {
            HTTPS_DEFAULT_PORT
        } else {
            HTTP_DEFAULT_PORT
        })
    }

    /// Explicit parameters plus the implicit `port` binding.
    pub fn bindings(params: &TemplateParams, url: &Url) -> TemplateParams {
        let mut bindings = params.clone();
        if !bindings.contains_key(PORT_PLACEHOLDER) {
            bindings.insert(PORT_PLACEHOLDER, Self::derive_port(url).to_string());
        }
        bindings
    }

    fn is_identifier(key: &str) -> bool {
        !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
    }
}
