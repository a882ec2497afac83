use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};

use mobile_locator::driver::adapter::Selector;
use mobile_locator::driver::scripted::{DriverCall, ScriptedElement, ScriptedScreen};

/// Matches the default `locator.dropdown.option_selector`.
pub const OPTION_XPATH: &str = r#"//android.view.View[@clickable="true"]"#;

pub fn sel(raw: &str) -> Selector {
    Selector::parse(raw).unwrap()
}

pub fn sels(raw: &[&str]) -> Vec<Selector> {
    Selector::parse_all(raw).unwrap()
}

pub fn field(label: &str, row: u32) -> ScriptedElement {
    ScriptedElement::new(vec![sel(&format!("~{}", label))])
        .with_label(label)
        .at_row(row)
        .editable()
}

pub fn button(label: &str, row: u32) -> ScriptedElement {
    ScriptedElement::new(vec![sel(&format!("~{}", label))])
        .with_label(label)
        .at_row(row)
}

pub fn option(label: &str) -> ScriptedElement {
    ScriptedElement::new(vec![sel(OPTION_XPATH)]).with_label(label)
}

/// Residence dropdown whose overlay also renders a scrim and an empty row.
pub fn residence(row: u32) -> ScriptedElement {
    button("Residence", row).with_options(vec![
        option("Scrim"),
        option(""),
        option("Alabama"),
        option("Texas"),
    ])
}

/// Fifteen-row signup form, five rows per screen.
///
/// Visible at offset 0: First Name, Last Name, Email.
/// After one swipe: Phone, Residence. After two: Zip, Submit.
pub fn signup_screen() -> ScriptedScreen {
    ScriptedScreen::new(vec![
        field("First Name", 0),
        field("Last Name", 1),
        field("Email", 3),
        field("Phone", 6),
        residence(8),
        field("Zip", 11),
        button("Submit", 14),
    ])
}

/// Position of every swipe in the call log.
pub fn swipe_positions(calls: &[DriverCall]) -> Vec<usize> {
    calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, DriverCall::Swipe { .. }))
        .map(|(i, _)| i)
        .collect()
}

/// Stand-in Appium server whose session dies right after it opens: `POST
/// /session` succeeds and every later request answers `invalid session id`.
/// Returns the base URL.
pub fn lost_session_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let request_line = read_request(&mut stream);
            let (status, body) = if request_line.starts_with("POST /session ") {
                ("200 OK", r#"{"value":{"sessionId":"s1","capabilities":{}}}"#)
            } else {
                (
                    "404 Not Found",
                    r#"{"value":{"error":"invalid session id","message":"gone"}}"#,
                )
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    url
}

/// Consume one HTTP request and return its request line.
fn read_request(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    let _ = reader.read_line(&mut request_line);

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
        if let Some(len) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = len.trim().parse().unwrap_or(0);
        }
    }
    let mut body = vec![0; content_length];
    let _ = reader.read_exact(&mut body);
    request_line
}
