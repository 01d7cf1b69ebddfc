//! Property-based tests for template resolution
//!
//! The tree walk is checked against the text-substitution algorithm it
//! replaces: serialize the template, replace each token's first occurrence
//! left to right, parse the result back. The two agree whenever substituted
//! values cannot be mistaken for tokens or JSON syntax.

#![allow(clippy::redundant_closure_for_method_calls)]

use super::*;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Reference Implementation
// ============================================================================

fn resolve_textual(source: &Value, template: &Value) -> Result<Value, TemplateError> {
    let mut text = serde_json::to_string(template).map_err(TemplateError::Serialize)?;
    let tokens: Vec<(String, String)> = placeholder_pattern()
        .captures_iter(&text)
        .filter_map(|c| Some((c.get(0)?.as_str().to_string(), c.get(1)?.as_str().to_string())))
        .collect();

    for (token, path) in tokens {
        let value = render(source, &token, &path)?;
        text = text.replacen(&token, &value, 1);
    }
    serde_json::from_str(&text).map_err(TemplateError::Shape)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        any::<i32>().prop_map(|n| json!(n)),
    ]
}

/// Flat source object: `{ key: leaf }`
fn arb_source() -> impl Strategy<Value = serde_json::Map<String, Value>> {
    proptest::collection::btree_map(arb_word(), arb_leaf(), 1..6)
        .prop_map(|entries| entries.into_iter().collect())
}

/// A template string mixing literal text and placeholders for known keys
fn arb_template_text(keys: Vec<String>) -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-zA-Z ,.!]{0,10}",
        proptest::sample::select(keys).prop_map(|k| format!("{{{{ {k} }}}}")),
    ];
    proptest::collection::vec(piece, 0..6).prop_map(|pieces| pieces.concat())
}

fn arb_source_and_template() -> impl Strategy<Value = (Value, Value)> {
    arb_source().prop_flat_map(|source| {
        let keys: Vec<String> = source.keys().cloned().collect();
        let template = (
            arb_template_text(keys.clone()),
            proptest::collection::vec(arb_template_text(keys), 0..3),
        )
            .prop_map(|(message, options)| {
                json!({
                    "id": "step",
                    "message": message,
                    "options": options
                        .into_iter()
                        .map(|t| json!({"text": t, "nextStepId": "next"}))
                        .collect::<Vec<_>>()
                })
            });
        (Just(Value::Object(source)), template)
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Tree walk and text substitution produce the same result
    #[test]
    fn prop_matches_textual_reference((source, template) in arb_source_and_template()) {
        let walked = resolve_value(&source, template.clone()).unwrap();
        let textual = resolve_textual(&source, &template).unwrap();
        prop_assert_eq!(walked, textual);
    }

    // Without placeholders resolution is the identity
    #[test]
    fn prop_identity_without_placeholders(
        message in "[a-zA-Z0-9 {}]{0,30}",
        source in arb_source(),
    ) {
        prop_assume!(!has_placeholders(&message));
        let template = json!({"id": "start", "message": message, "endJourney": false});
        let resolved = resolve_value(&Value::Object(source), template.clone()).unwrap();
        prop_assert_eq!(resolved, template);
    }

    // The same path always renders the same value
    #[test]
    fn prop_repeated_tokens_agree(source in arb_source(), repeats in 1usize..5) {
        let key = source.keys().next().cloned().unwrap();
        let template = vec![format!("{{{{{key}}}}}"); repeats].join("|");
        let rendered = resolve_str(&Value::Object(source), &template).unwrap();
        let parts: Vec<&str> = rendered.split('|').collect();
        prop_assert_eq!(parts.len(), repeats);
        prop_assert!(parts.iter().all(|p| *p == parts[0]));
    }

    // Unknown paths always fail, never render as empty text
    #[test]
    fn prop_missing_path_fails(source in arb_source(), key in "[A-Z]{3,6}") {
        let result = resolve_str(&Value::Object(source), &format!("x {{{{ {key} }}}} y"));
        let failed_as_undefined =
            matches!(result, Err(TemplateError::UnsupportedType { found: "undefined", .. }));
        prop_assert!(failed_as_undefined);
    }
}
