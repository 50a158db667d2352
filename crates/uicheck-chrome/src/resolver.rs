//! In-page locator resolution.
//!
//! Locators are evaluated by a small script (`resolve.js`) that implements
//! the matching rules against the live DOM: implicit ARIA roles, accessible
//! names, innermost text matches, `hasText` and `nth`. The locator is passed
//! as JSON, never spliced in as source text.

use crate::error::{BrowserError, Result};
use uicheck_core::{ElementProbe, Locator};

const RESOLVER: &str = include_str!("resolve.js");

/// Attribute the resolver sets on the element a click should hit.
pub(crate) const TARGET_ATTRIBUTE: &str = "data-uicheck-target";

/// Builds the expression that resolves `locator`. With `mark`, the first
/// match is tagged with [`TARGET_ATTRIBUTE`].
pub(crate) fn script(locator: &Locator, mark: Option<&str>) -> Result<String> {
    let segments = serde_json::to_string(locator)
        .map_err(|e| BrowserError::ScriptExecutionFailed(e.to_string()))?;
    let mark = serde_json::to_string(&mark)
        .map_err(|e| BrowserError::ScriptExecutionFailed(e.to_string()))?;
    Ok(format!("({})({segments}, {mark})", RESOLVER.trim()))
}

/// CSS selector for the element tagged with `mark`.
pub(crate) fn target_selector(mark: &str) -> String {
    format!("[{TARGET_ATTRIBUTE}=\"{mark}\"]")
}

/// Script that removes the click marker, if the element still exists.
pub(crate) fn unmark_script(mark: &str) -> String {
    format!(
        "document.querySelectorAll('{}').forEach((el) => el.removeAttribute('{TARGET_ATTRIBUTE}'))",
        target_selector(mark)
    )
}

/// Parses the JSON string returned by the resolver.
pub(crate) fn parse_probe(raw: &str) -> Result<ElementProbe> {
    serde_json::from_str(raw).map_err(|e| {
        BrowserError::ScriptExecutionFailed(format!("unexpected resolver output: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uicheck_core::Rect;

    #[test]
    fn locator_is_passed_as_json() {
        let locator = Locator::text("Ceramic Modern Coffee Mug")
            .locator(Locator::role_named("row", "Print run"))
            .locator(Locator::css("td"))
            .nth(1);
        let script = script(&locator, None).unwrap();

        assert!(script.contains("(segments, mark) =>"));
        assert!(script.ends_with(
            r#"([{"text":"Ceramic Modern Coffee Mug"},{"role":"row","name":"Print run"},{"css":"td","nth":1}], null)"#
        ));
    }

    #[test]
    fn hostile_text_stays_inside_a_string_literal() {
        let locator = Locator::text("'); alert('xss');//\n`${x}`");
        let script = script(&locator, Some("abc")).unwrap();
        assert!(script.contains(r#"{"text":"'); alert('xss');//\n`${x}`"}"#));
        assert!(script.ends_with(r#", "abc")"#));
    }

    #[test]
    fn parses_resolver_output() {
        let probe = parse_probe(
            r#"{"count":2,"visible":true,"bounds":{"x":1,"y":2,"width":30,"height":4},"text":"Red"}"#,
        )
        .unwrap();
        assert_eq!(probe.count, 2);
        assert_eq!(probe.bounds, Some(Rect::new(1.0, 2.0, 30.0, 4.0)));
        assert_eq!(probe.text.as_deref(), Some("Red"));

        let absent =
            parse_probe(r#"{"count":0,"visible":false,"bounds":null,"text":null}"#).unwrap();
        assert_eq!(absent, ElementProbe::absent());
    }

    #[test]
    fn marker_selector() {
        assert_eq!(target_selector("1234"), r#"[data-uicheck-target="1234"]"#);
        assert!(unmark_script("1234").contains(r#"[data-uicheck-target="1234"]"#));
    }
}
