#![cfg(target_arch = "wasm32")]

use fruit_match_ai::{
    extract_features_js, Candidate, Decision, Difficulty, Entity, Feature, FeatureVector,
    GameStateView, MatchAi, Vec3, WeightVector,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn sample_view_json() -> String {
    serde_json::to_string(&GameStateView::sample(5)).expect("sample view should serialize")
}

#[wasm_bindgen_test]
fn decide_json_returns_a_match_on_a_filled_board() {
    let ai = MatchAi::new(None, Some("hard".into())).expect("engine should start");
    let json = ai
        .decide_json(&sample_view_json())
        .expect("decision should serialize");
    let decision: Decision = serde_json::from_str(&json).expect("decision should parse");
    assert!(matches!(decision.candidate, Candidate::Match { .. }));
    assert_eq!(ai.history_len(), 1);
}

#[wasm_bindgen_test]
fn outcomes_are_recorded_by_move_id() {
    let ai = MatchAi::new(None, None).expect("engine should start");
    let json = ai
        .decide_json(&sample_view_json())
        .expect("decision should serialize");
    let decision: Decision = serde_json::from_str(&json).expect("decision should parse");
    let move_id = decision.move_id.expect("match should carry a move id");
    assert!(ai.record_outcome(move_id, true));
    assert!(!ai.record_outcome(move_id + 1000, true));
    assert!(ai.prediction_accuracy().is_some());
}

#[wasm_bindgen_test]
fn malformed_weights_reject_construction() {
    assert!(MatchAi::new(Some(r#"{ "risk": 1.0 }"#.into()), None).is_err());
    let weights = serde_json::to_string(&WeightVector::default()).expect("weights serialize");
    assert!(MatchAi::new(Some(weights), None).is_ok());
}

#[wasm_bindgen_test]
fn unknown_difficulty_is_ignored() {
    let ai = MatchAi::new(None, Some("easy".into())).expect("engine should start");
    assert!(!ai.set_difficulty("nightmare"));
    assert_eq!(ai.thinking_delay_ms(), 1500);
    assert!(ai.set_difficulty("expert"));
    assert_eq!(ai.thinking_delay_ms(), 400);
}

#[wasm_bindgen_test]
fn extract_features_reports_the_pair_vector() {
    let view = GameStateView::new(
        vec![
            Entity::new(1, "apple", Vec3::new(0.0, 0.0, 0.0)).power_up(),
            Entity::new(2, "apple", Vec3::new(4.0, 0.0, 0.0)),
            Entity::new(3, "grape", Vec3::new(2.0, 0.0, 0.0)),
        ],
        Difficulty::Medium,
    );
    let js_view = serde_wasm_bindgen::to_value(&view).expect("view should convert");

    let value = extract_features_js(js_view.clone(), 2, 1).expect("apples should pair");
    let features: FeatureVector =
        serde_wasm_bindgen::from_value(value).expect("features should convert back");
    assert_eq!(features.get(Feature::MatchSimilarity), 1.0);
    assert_eq!(features.get(Feature::PowerUp), 1.0);
    assert!((features.get(Feature::Distance) - 0.2).abs() < 1e-9);

    assert!(extract_features_js(js_view, 1, 3).is_err());
}
