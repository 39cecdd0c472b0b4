//! Askama filters for the Liquid section template.
//!
//! Text written into a Liquid asset must not open a Liquid tag or output, so
//! every `{` in user-supplied text is rewritten before Shopify sees it.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Replace `{` with its HTML character reference.
///
/// Apply after `escape("html")`: `{{ name|escape("html")|liquid_inert }}`.
#[askama::filter_fn]
pub fn liquid_inert(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.to_string().replace('{', "&#123;"))
}

/// Escape `{` inside the string literals of a JSON document.
///
/// Usage in templates: `{{ variants_json|liquid_json }}`
#[askama::filter_fn]
pub fn liquid_json(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(escape_json_braces(&value.to_string()))
}

/// Rewrite `{` as `\u007b` wherever it appears inside a JSON string.
///
/// Structural braces are left alone, so the document parses to the same value.
#[must_use]
pub fn escape_json_braces(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c == '{' {
                out.push_str("\\u007b");
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_braces_escaped_only_in_strings() {
        let value = json!([{"name": "Red {{ x", "note": "{% endschema %}"}]);
        let escaped = escape_json_braces(&value.to_string());

        assert!(!escaped.contains("{{"));
        assert!(!escaped.contains("{%"));
        assert!(escaped.starts_with("[{\""));

        let parsed: serde_json::Value = serde_json::from_str(&escaped).expect("valid json");
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_json_escaped_quotes_do_not_end_string() {
        let value = json!({"a": "say \"{{ hi }}\""});
        let escaped = escape_json_braces(&value.to_string());
        assert!(!escaped.contains("{{"));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&escaped).expect("json"),
            value
        );
    }
}
