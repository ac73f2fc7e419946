#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Object, Reflect};
use quantum_go::wasm::QuantumGo;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn field(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).expect("readable field")
}

fn playing() -> QuantumGo {
    let mut game = QuantumGo::new(JsValue::UNDEFINED).expect("default options");
    game.start();
    game
}

#[wasm_bindgen_test]
fn ready() {
    assert!(quantum_go::wasm_ready());
}

#[wasm_bindgen_test]
fn accepted_move_reports_the_summary() {
    let mut game = playing();

    let outcome = game.play("3,3", "black").expect("valid arguments");

    assert_eq!(field(&outcome, "outcome").as_string().as_deref(), Some("moved"));
    let summary = field(&outcome, "data");
    assert_eq!(field(&summary, "phase").as_string().as_deref(), Some("white-pending"));
    assert_eq!(field(&summary, "toMove").as_string().as_deref(), Some("white"));
}

#[wasm_bindgen_test]
fn illegal_move_is_an_outcome_not_an_exception() {
    let mut game = playing();
    game.play("3,3", "black").expect("valid arguments");

    let outcome = game.play("3,3", "white").expect("valid arguments");

    assert_eq!(field(&outcome, "outcome").as_string().as_deref(), Some("rejected"));
    assert!(game.play("0,3", "white").is_err());
    assert!(game.play("3,4", "green").is_err());
}

#[wasm_bindgen_test]
fn snapshot_restores_in_a_new_instance() {
    let mut game = playing();
    for (pos, color) in [("3,3", "black"), ("3,4", "white"), ("5,5", "black")] {
        game.play(pos, color).expect("valid arguments");
    }

    let snapshot = game.snapshot().expect("serializable");
    let restored = QuantumGo::from_snapshot(snapshot).expect("restorable");

    let records = Array::from(&restored.records().expect("serializable"));
    assert_eq!(records.length(), 3);
    let state = restored.state().expect("serializable");
    assert_eq!(field(&state, "toMove").as_string().as_deref(), Some("white"));
}

#[wasm_bindgen_test]
fn options_pick_board_size_and_clock() {
    let options = Object::new();
    Reflect::set(&options, &"boardSize".into(), &JsValue::from_f64(13.0)).expect("settable");
    let time = Object::new();
    Reflect::set(&time, &"type".into(), &"absolute".into()).expect("settable");
    Reflect::set(&time, &"mainTimeMS".into(), &JsValue::from_f64(60_000.0)).expect("settable");
    Reflect::set(&options, &"timeControl".into(), &time).expect("settable");

    let mut game = QuantumGo::new(options.into()).expect("valid options");
    game.start();

    let remaining = game.ms_until_timeout("black").expect("valid color");
    assert!(remaining.is_some_and(|ms| ms <= 60_000.0));
    assert_eq!(game.ms_until_timeout("white").expect("valid color"), None);
    assert!(game.play("13,13", "black").is_ok());
}
