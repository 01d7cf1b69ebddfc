//! Property-based tests for the state machine
//!
//! Conversations are generated as random (but valid) step graphs, then
//! driven with random input to check the invariants every turn must keep.

use super::*;
use crate::action::{ActionError, ActionResult};
use crate::flow::{
    find_step, ActionSpec, ConversationDefinition, ConversationRegistry, MediaHeader, Step,
    StepOption,
};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

const TRIGGER: &str = "/go";
const LABELS: [&str; 3] = ["a", "b", "c"];

fn step_id(index: usize) -> String {
    if index == 0 {
        "start".to_string()
    } else {
        format!("s{index}")
    }
}

/// Walk the effects of one transition, feeding a pending action its outcome
fn run_turn(
    state: &ChatState,
    registry: &ConversationRegistry,
    event: Event,
    action_succeeds: bool,
) -> Result<TransitionResult, TransitionError> {
    let result = transition(state, registry, event)?;
    let Some(Effect::RunAction {
        conversation_id,
        step_id,
        ..
    }) = result.effects.first().cloned()
    else {
        return Ok(result);
    };
    let outcome = if action_succeeds {
        Event::ActionSucceeded {
            conversation_id,
            step_id,
            result: ActionResult::ok(json!({"name": "Ada", "count": 3})),
        }
    } else {
        Event::ActionFailed {
            conversation_id,
            step_id,
            error: ActionError::network("unreachable"),
        }
    };
    transition(&result.new_state, registry, outcome)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
struct StepShape {
    options: Vec<(usize, usize)>,
    default_next: Option<usize>,
    has_action: bool,
    has_media: bool,
    end_journey: bool,
}

fn arb_step_shape(step_count: usize) -> impl Strategy<Value = StepShape> {
    (
        proptest::collection::vec((0..LABELS.len(), 0..step_count), 0..3),
        proptest::option::of(0..step_count),
        any::<bool>(),
        any::<bool>(),
        prop::bool::weighted(0.2),
    )
        .prop_map(
            |(options, default_next, has_action, has_media, end_journey)| StepShape {
                options,
                default_next,
                has_action,
                has_media,
                end_journey,
            },
        )
}

fn build_step(index: usize, shape: StepShape) -> Step {
    let mut options: Vec<StepOption> = Vec::new();
    for (label, target) in shape.options {
        // First declaration of a label wins; keep labels unique for clarity
        if options.iter().any(|o| o.text == LABELS[label]) {
            continue;
        }
        options.push(StepOption {
            text: LABELS[label].to_string(),
            next_step_id: step_id(target),
        });
    }
    Step {
        id: step_id(index),
        message: if shape.has_action {
            "Hello {{ data.name }}, you have {{data.count}} items".to_string()
        } else {
            format!("Step {index}")
        },
        options,
        default_next_step: shape.default_next.map(step_id),
        action: shape
            .has_action
            .then(|| ActionSpec::get("https://api.example.com/items")),
        header: shape.has_media.then(|| MediaHeader {
            photo: Some("photo.jpg".to_string()),
            document: Some("doc.pdf".to_string()),
            ..MediaHeader::default()
        }),
        end_journey: shape.end_journey,
    }
}

fn arb_registry() -> impl Strategy<Value = ConversationRegistry> {
    (2usize..7)
        .prop_flat_map(|count| proptest::collection::vec(arb_step_shape(count), count))
        .prop_map(|shapes| {
            let steps = shapes
                .into_iter()
                .enumerate()
                .map(|(i, shape)| build_step(i, shape))
                .collect();
            let conversation = ConversationDefinition {
                id: "flow".to_string(),
                triggers: vec![TRIGGER.to_string()],
                steps,
            };
            ConversationRegistry::new(vec![conversation]).expect("generated graph is valid")
        })
}

fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("b".to_string()),
        Just("c".to_string()),
        Just(TRIGGER.to_string()),
        "[a-z ]{1,10}",
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn state_is_valid(state: &ChatState, registry: &ConversationRegistry) -> bool {
    match state {
        ChatState::Idle => true,
        ChatState::InStep {
            conversation_id,
            step_id,
        } => registry
            .find_by_id(conversation_id)
            .is_some_and(|c| find_step(step_id, c).is_some()),
    }
}

fn effects_are_ordered(effects: &[Effect]) -> bool {
    let message = effects
        .iter()
        .position(|e| matches!(e, Effect::SendMessage { .. }));
    let last_media = effects.iter().rposition(|e| {
        matches!(
            e,
            Effect::SendPhoto { .. } | Effect::SendVideo { .. } | Effect::SendDocument { .. }
        )
    });
    let persist = effects
        .iter()
        .position(|e| matches!(e, Effect::PersistSession { .. }));
    let clear = effects.iter().position(|e| matches!(e, Effect::ClearSession));

    match (last_media, message) {
        (Some(m), Some(msg)) if m > msg => return false,
        (Some(_), None) => return false,
        _ => {}
    }
    match (persist, message) {
        (Some(p), Some(msg)) if p > msg => return false,
        _ => {}
    }
    // A journey ends before anything of the final step goes out
    match (clear, persist) {
        (Some(c), Some(p)) => c == p + 1,
        (Some(_), None) => false,
        _ => true,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Random walks never leave the chat pointing at a missing step
    #[test]
    fn prop_walk_preserves_validity(
        registry in arb_registry(),
        inputs in proptest::collection::vec((arb_input(), any::<bool>()), 1..25)
    ) {
        let mut state = ChatState::Idle;
        for (text, action_succeeds) in inputs {
            let result = run_turn(&state, &registry, Event::inbound(text), action_succeeds);
            prop_assert!(result.is_ok(), "Transition failed: {:?}", result);
            let result = result.unwrap();

            prop_assert!(state_is_valid(&result.new_state, &registry), "Invalid state: {:?}", result.new_state);
            prop_assert!(effects_are_ordered(&result.effects), "Bad order: {:?}", result.effects);
            state = result.new_state;
        }
    }

    /// A pending action is requested alone: nothing sent, nothing persisted
    #[test]
    fn prop_action_is_requested_alone(
        registry in arb_registry(),
        text in arb_input(),
        start_in_flow in any::<bool>()
    ) {
        let state = if start_in_flow {
            ChatState::in_step("flow", "start")
        } else {
            ChatState::Idle
        };
        let result = transition(&state, &registry, Event::inbound(text)).unwrap();
        if result.effects.iter().any(|e| matches!(e, Effect::RunAction { .. })) {
            prop_assert_eq!(result.effects.len(), 1);
            prop_assert_eq!(result.new_state, state);
        }
    }

    /// A failed action produces exactly one failure and leaves the state alone
    #[test]
    fn prop_action_failure_is_contained(registry in arb_registry(), step in 0usize..7) {
        let conversation = registry.find_by_id("flow").unwrap();
        prop_assume!(step < conversation.steps.len());

        let state = ChatState::in_step("flow", "start");
        let result = transition(&state, &registry, Event::ActionFailed {
            conversation_id: "flow".to_string(),
            step_id: step_id(step),
            error: ActionError::network("down"),
        }).unwrap();

        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects.len(), 1);
        prop_assert!(
            matches!(result.effects[0], Effect::TurnFailed { .. }),
            "Expected TurnFailed, got {:?}",
            result.effects
        );
    }

    /// Unmatched input without a default re-offers the same options
    #[test]
    fn prop_invalid_option_self_loops(registry in arb_registry(), text in "[x-z]{2,8}") {
        let conversation = registry.find_by_id("flow").unwrap();
        let start = find_step("start", conversation).unwrap();
        prop_assume!(start.default_next_step.is_none());

        let state = ChatState::in_step("flow", "start");
        let result = transition(&state, &registry, Event::inbound(text)).unwrap();

        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(
            result.effects,
            vec![Effect::notice(Notice::InvalidOption, start.option_labels())]
        );
    }

    /// Clearing the session and ending up idle always go together
    #[test]
    fn prop_clear_means_idle(
        registry in arb_registry(),
        inputs in proptest::collection::vec((arb_input(), any::<bool>()), 1..15)
    ) {
        let mut state = ChatState::Idle;
        for (text, action_succeeds) in inputs {
            let result = run_turn(&state, &registry, Event::inbound(text), action_succeeds).unwrap();
            let cleared = result.effects.contains(&Effect::ClearSession);
            let persisted = result.effects.iter().any(|e| matches!(e, Effect::PersistSession { .. }));
            if cleared {
                prop_assert_eq!(&result.new_state, &ChatState::Idle);
            }
            if persisted && !cleared {
                prop_assert_ne!(&result.new_state, &ChatState::Idle);
            }
            state = result.new_state;
        }
    }

    /// Placeholders never reach the user once an action succeeded
    #[test]
    fn prop_materialized_message_has_no_placeholders(
        registry in arb_registry(),
        inputs in proptest::collection::vec(arb_input(), 1..15)
    ) {
        let mut state = ChatState::Idle;
        for text in inputs {
            let result = run_turn(&state, &registry, Event::inbound(text), true).unwrap();
            for effect in &result.effects {
                if let Effect::SendMessage { text, .. } = effect {
                    prop_assert!(!text.contains("{{"), "Unresolved: {}", text);
                }
            }
            state = result.new_state;
        }
    }
}
