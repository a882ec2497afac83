use mobile_locator::driver::adapter::Point;
use mobile_locator::driver::appium::{
    W3C_ELEMENT_KEY, WireError, classify_wire_error, decode_find_response, decode_response,
    new_session_body,
    parse_element_id, swipe_actions, tap_actions,
};
use mobile_locator::error::DriverError;
use serde_json::json;

#[test]
fn decode_response_returns_value() {
    let value = decode_response("get_text", 200, r#"{"value":"Jane"}"#).unwrap();
    assert_eq!(value, json!("Jane"));
}

#[test]
fn decode_response_classifies_session_loss() {
    let body = r#"{"value":{"error":"invalid session id","message":"gone","stacktrace":""}}"#;
    let err = decode_response("find", 404, body).unwrap_err();
    assert!(err.is_session_lost());
}

#[test]
fn decode_response_classifies_stale_element() {
    let body = r#"{"value":{"error":"stale element reference","message":"detached"}}"#;
    let err = decode_response("click", 404, body).unwrap_err();
    assert!(err.is_stale());
}

#[test]
fn decode_response_http_error_without_payload() {
    let err = decode_response("click", 500, r#"{"value":null}"#).unwrap_err();
    match err {
        DriverError::Command { command, message } => {
            assert_eq!(command, "click");
            assert!(message.contains("500"));
        }
        other => panic!("Expected Command error, got {:?}", other),
    }
}

#[test]
fn decode_response_rejects_invalid_json() {
    let err = decode_response("source", 200, "<html>").unwrap_err();
    assert!(matches!(err, DriverError::JsonParse { .. }));
}

#[test]
fn decode_find_response_treats_no_such_element_as_absent() {
    let body = r#"{"value":{"error":"no such element","message":"not there"}}"#;
    assert!(decode_find_response(404, body).unwrap().is_none());

    let found = decode_find_response(200, &format!(r#"{{"value":{{"{}":"el-7"}}}}"#, W3C_ELEMENT_KEY))
        .unwrap()
        .unwrap();
    assert_eq!(parse_element_id(&found).as_deref(), Some("el-7"));
}

#[test]
fn decode_find_response_keeps_other_errors() {
    let body = r#"{"value":{"error":"invalid session id","message":"gone"}}"#;
    assert!(decode_find_response(404, body).unwrap_err().is_session_lost());

    let err = decode_find_response(500, r#"{"value":null}"#).unwrap_err();
    assert!(matches!(err, DriverError::Command { ref command, .. } if command == "find"));
}

#[test]
fn other_wire_errors_become_command_errors() {
    let error = WireError {
        error: "element not interactable".into(),
        message: "covered".into(),
    };
    let err = classify_wire_error("click", &error);
    assert_eq!(err.to_string(), "click failed: covered (element not interactable)");
}

#[test]
fn element_id_from_w3c_and_legacy_references() {
    assert_eq!(
        parse_element_id(&json!({ W3C_ELEMENT_KEY: "abc-1" })),
        Some("abc-1".to_string())
    );
    assert_eq!(
        parse_element_id(&json!({ "ELEMENT": "legacy-2" })),
        Some("legacy-2".to_string())
    );
    assert_eq!(parse_element_id(&json!({ "other": 1 })), None);
}

#[test]
fn swipe_actions_hold_then_move() {
    let actions = swipe_actions(Point::new(540, 1800), Point::new(540, 600), 1000);
    let steps = actions["actions"][0]["actions"].as_array().unwrap();

    assert_eq!(actions["actions"][0]["parameters"]["pointerType"], "touch");
    assert_eq!(steps.len(), 5);
    assert_eq!(steps[0]["y"], 1800);
    assert_eq!(steps[1]["type"], "pointerDown");
    assert_eq!(steps[2]["type"], "pause");
    assert_eq!(steps[3]["duration"], 1000);
    assert_eq!(steps[3]["y"], 600);
    assert_eq!(steps[4]["type"], "pointerUp");
}

#[test]
fn tap_actions_target_point() {
    let actions = tap_actions(Point::new(10, 20));
    let steps = actions["actions"][0]["actions"].as_array().unwrap();
    assert_eq!(steps[0]["x"], 10);
    assert_eq!(steps[0]["y"], 20);
    assert_eq!(steps.last().unwrap()["type"], "pointerUp");
}

#[test]
fn new_session_body_wraps_capabilities() {
    let caps = json!({ "platformName": "Android", "appium:appPackage": "com.example" });
    let body = new_session_body(&caps);
    assert_eq!(body["capabilities"]["alwaysMatch"], caps);
    assert_eq!(body["capabilities"]["firstMatch"], json!([{}]));
}
