use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::driver::adapter::{Driver, ElementHandle, Point, Selector, Viewport};
use crate::error::DriverError;

/// Key under which W3C servers return element references.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How long the finger rests before a swipe starts moving.
const PRESS_HOLD_MS: u64 = 300;

/// Envelope of every W3C WebDriver response.
#[derive(Debug, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub value: Value,
}

/// Error payload carried in `value` on failure.
#[derive(Debug, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl WireResponse {
    /// The W3C error object, if the response carries one.
    pub fn error(&self) -> Option<WireError> {
        if self.value.get("error").is_none() {
            return None;
        }
        serde_json::from_value(self.value.clone()).ok()
    }
}

/// Map a W3C error code onto the driver error taxonomy.
pub fn classify_wire_error(command: &str, error: &WireError) -> DriverError {
    match error.error.as_str() {
        "invalid session id" | "session not created" => {
            DriverError::SessionLost(format!("{}: {}", command, error.message))
        }
        "stale element reference" => {
            DriverError::StaleElement(format!("{}: {}", command, error.message))
        }
        code => DriverError::command(command, format!("{} ({})", error.message, code)),
    }
}

/// Parse a response body into its `value`, surfacing protocol errors.
pub fn decode_response(command: &str, status: u16, body: &str) -> Result<Value, DriverError> {
    let response = parse_wire(command, body)?;
    if let Some(err) = response.error() {
        return Err(classify_wire_error(command, &err));
    }
    check_status(command, status)?;
    Ok(response.value)
}

/// Like [`decode_response`] for element lookups: "no such element" is an
/// empty answer, not an error.
pub fn decode_find_response(status: u16, body: &str) -> Result<Option<Value>, DriverError> {
    let response = parse_wire("find", body)?;
    match response.error() {
        Some(err) if err.error == "no such element" => Ok(None),
        Some(err) => Err(classify_wire_error("find", &err)),
        None => {
            check_status("find", status)?;
            Ok(Some(response.value))
        }
    }
}

fn check_status(command: &str, status: u16) -> Result<(), DriverError> {
    if status >= 400 {
        return Err(DriverError::command(
            command,
            format!("HTTP {} without error payload", status),
        ));
    }
    Ok(())
}

fn parse_wire(command: &str, body: &str) -> Result<WireResponse, DriverError> {
    serde_json::from_str(body).map_err(|e| DriverError::JsonParse {
        context: format!("{} response", command),
        source: e,
    })
}

/// Extract an element id from a W3C (or legacy JSONWP) element reference.
pub fn parse_element_id(value: &Value) -> Option<String> {
    value
        .get(W3C_ELEMENT_KEY)
        .or_else(|| value.get("ELEMENT"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// W3C pointer action sequence for a single-finger swipe.
pub fn swipe_actions(from: Point, to: Point, duration_ms: u64) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "finger1",
            "parameters": { "pointerType": "touch" },
            "actions": [
                { "type": "pointerMove", "duration": 0, "x": from.x, "y": from.y },
                { "type": "pointerDown", "button": 0 },
                { "type": "pause", "duration": PRESS_HOLD_MS },
                { "type": "pointerMove", "duration": duration_ms, "x": to.x, "y": to.y },
                { "type": "pointerUp", "button": 0 }
            ]
        }]
    })
}

/// W3C pointer action sequence for a tap at a fixed point.
pub fn tap_actions(point: Point) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "finger1",
            "parameters": { "pointerType": "touch" },
            "actions": [
                { "type": "pointerMove", "duration": 0, "x": point.x, "y": point.y },
                { "type": "pointerDown", "button": 0 },
                { "type": "pause", "duration": 50 },
                { "type": "pointerUp", "button": 0 }
            ]
        }]
    })
}

/// New-session payload wrapping user capabilities.
pub fn new_session_body(capabilities: &Value) -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": capabilities,
            "firstMatch": [{}]
        }
    })
}

/// A live Appium session spoken to over the W3C WebDriver HTTP protocol.
///
/// Every method is a blocking request; the session is closed on `quit` or
/// when the driver is dropped.
pub struct AppiumDriver {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl AppiumDriver {
    /// Open a new session on the Appium server at `server_url`.
    pub fn connect(server_url: &str, capabilities: &Value) -> Result<Self, DriverError> {
        let client = Client::new();
        let base_url = server_url.trim_end_matches('/').to_string();

        info!("Opening Appium session at {}", base_url);
        let response = client
            .post(format!("{}/session", base_url))
            .json(&new_session_body(capabilities))
            .send()
            .map_err(|e| transport_error("new_session", e))?;
        let status = response.status().as_u16();
        let body = response.text()?;
        let value = decode_response("new_session", status, &body)?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| DriverError::command("new_session", "No sessionId in response"))?
            .to_string();

        info!("Appium session {} ready", session_id);
        Ok(AppiumDriver {
            client,
            base_url,
            session_id: Some(session_id),
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Send a command and return the HTTP status with the raw body.
    fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        command: &str,
    ) -> Result<(u16, String), DriverError> {
        let session_id = self
            .session_id
            .as_deref()
            .ok_or_else(|| DriverError::SessionLost("session already closed".into()))?;

        let url = format!("{}/session/{}{}", self.base_url, session_id, path);
        debug!(command, %url, "appium request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| transport_error(command, e))?;
        let status = response.status().as_u16();
        Ok((status, response.text()?))
    }

    /// Send a command and return its `value`, failing on any protocol error.
    fn send_ok(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        command: &str,
    ) -> Result<Value, DriverError> {
        let (status, text) = self.send_raw(method, path, body, command)?;
        decode_response(command, status, &text)
    }

    fn send_find(&self, path: &str, selector: &Selector) -> Result<Option<Value>, DriverError> {
        let body = json!({ "using": selector.strategy(), "value": selector.value() });
        let (status, text) = self.send_raw(Method::POST, path, Some(&body), "find")?;
        decode_find_response(status, &text)
    }

    fn element_path(element: &ElementHandle, suffix: &str) -> String {
        format!("/element/{}{}", element.id(), suffix)
    }

    /// Close the session. Safe to call more than once.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        if self.session_id.is_none() {
            return Ok(());
        }
        let result = self.send_ok(Method::DELETE, "", None, "quit");
        self.session_id = None;
        result.map(|_| ())
    }
}

fn transport_error(command: &str, err: reqwest::Error) -> DriverError {
    if err.is_connect() {
        DriverError::SessionLost(format!("{}: {}", command, err))
    } else {
        DriverError::Transport(err)
    }
}

impl Driver for AppiumDriver {
    fn find(&mut self, selector: &Selector) -> Result<Option<ElementHandle>, DriverError> {
        Ok(self
            .send_find("/element", selector)?
            .and_then(|value| parse_element_id(&value))
            .map(ElementHandle::new))
    }

    fn find_all(&mut self, selector: &Selector) -> Result<Vec<ElementHandle>, DriverError> {
        let value = match self.send_find("/elements", selector)? {
            Some(value) => value,
            None => return Ok(Vec::new()),
        };
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(parse_element_id)
                    .map(ElementHandle::new)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, DriverError> {
        let path = Self::element_path(element, "/displayed");
        let value = self.send_ok(Method::GET, &path, None, "is_displayed")?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn tap(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        let path = Self::element_path(element, "/click");
        self.send_ok(Method::POST, &path, Some(&json!({})), "click")?;
        Ok(())
    }

    fn clear_text(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        let path = Self::element_path(element, "/clear");
        self.send_ok(Method::POST, &path, Some(&json!({})), "clear")?;
        Ok(())
    }

    fn set_text(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        let path = Self::element_path(element, "/value");
        self.send_ok(Method::POST, &path, Some(&json!({ "text": text })), "set_value")?;
        Ok(())
    }

    fn get_text(&mut self, element: &ElementHandle) -> Result<String, DriverError> {
        let path = Self::element_path(element, "/text");
        let value = self.send_ok(Method::GET, &path, None, "get_text")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let path = Self::element_path(element, &format!("/attribute/{}", name));
        let value = self.send_ok(Method::GET, &path, None, "get_attribute")?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    fn viewport(&mut self) -> Result<Viewport, DriverError> {
        let value = self.send_ok(Method::GET, "/window/rect", None, "window_rect")?;
        let width = value["width"].as_f64();
        let height = value["height"].as_f64();
        match (width, height) {
            (Some(w), Some(h)) => Ok(Viewport {
                width: w as u32,
                height: h as u32,
            }),
            _ => Err(DriverError::command("window_rect", "Missing width/height")),
        }
    }

    fn perform_swipe(
        &mut self,
        from: Point,
        to: Point,
        duration_ms: u64,
    ) -> Result<(), DriverError> {
        let actions = swipe_actions(from, to, duration_ms);
        self.send_ok(Method::POST, "/actions", Some(&actions), "perform_actions")?;
        self.send_ok(Method::DELETE, "/actions", None, "release_actions")?;
        Ok(())
    }

    fn tap_point(&mut self, point: Point) -> Result<(), DriverError> {
        let actions = tap_actions(point);
        self.send_ok(Method::POST, "/actions", Some(&actions), "perform_actions")?;
        self.send_ok(Method::DELETE, "/actions", None, "release_actions")?;
        Ok(())
    }

    fn is_soft_input_shown(&mut self) -> Result<bool, DriverError> {
        let value = self.send_ok(
            Method::GET,
            "/appium/device/is_keyboard_shown",
            None,
            "is_keyboard_shown",
        )?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn hide_soft_input(&mut self) -> Result<bool, DriverError> {
        // Appium raises when asked to hide a keyboard that is not there
        if !self.is_soft_input_shown()? {
            return Ok(false);
        }
        self.send_ok(
            Method::POST,
            "/appium/device/hide_keyboard",
            Some(&json!({})),
            "hide_keyboard",
        )?;
        Ok(true)
    }

    fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        let value = self.send_ok(Method::GET, "/screenshot", None, "screenshot")?;
        let encoded = value
            .as_str()
            .ok_or_else(|| DriverError::command("screenshot", "Screenshot is not a string"))?;
        Ok(STANDARD.decode(encoded)?)
    }

    fn page_source(&mut self) -> Result<String, DriverError> {
        let value = self.send_ok(Method::GET, "/source", None, "page_source")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn pause(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

impl Drop for AppiumDriver {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!("Failed to close Appium session: {}", e);
        }
    }
}
