use std::collections::HashMap;

use tracing::warn;

use crate::driver::adapter::Selector;
use crate::error::LocatorError;

/// Expands placeholders in scenario values.
///
/// - `${name}` is replaced by a scenario variable
/// - `{{gen:kind}}` is replaced by generated test data, unique per run
///   (`email`, `phone`, `ssn`, `zipcode`, `name`; anything else yields
///   `test_<token>`)
///
/// Unknown variables are left in place so the mistake is visible in the
/// typed value and in the report.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    variables: &'a HashMap<String, String>,
    token: u64,
}

impl<'a> Template<'a> {
    pub fn new(variables: &'a HashMap<String, String>, token: u64) -> Self {
        Self { variables, token }
    }

    pub fn render(&self, input: &str) -> String {
        let with_variables = self.substitute_variables(input);
        self.substitute_generators(&with_variables)
    }

    /// Render a selector's value and parse the result again.
    ///
    /// Bare text parses as a resource id, so the value of a resource id
    /// selector is re-read as shorthand: `${field}` with `field: "~Email"`
    /// becomes an accessibility id. A value that renders empty is rejected.
    pub fn render_selector(&self, selector: &Selector) -> Result<Selector, LocatorError> {
        let rendered = self.render(selector.value());
        if rendered == selector.value() {
            return Ok(selector.clone());
        }
        let raw = match selector {
            Selector::ResourceId(_) => rendered,
            other => other.with_value(rendered).to_string(),
        };
        Selector::parse(&raw)
    }

    pub fn render_selectors(&self, selectors: &[Selector]) -> Result<Vec<Selector>, LocatorError> {
        selectors.iter().map(|s| self.render_selector(s)).collect()
    }

    fn substitute_variables(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = &after[..end];
            match self.variables.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    warn!(variable = name, "undefined scenario variable");
                    out.push_str(&rest[start..start + 2 + end + 1]);
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }

    fn substitute_generators(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("{{gen:") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 6..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };
            out.push_str(&generate(after[..end].trim(), self.token));
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// Generated test data derived from a run token (typically a timestamp).
pub fn generate(kind: &str, token: u64) -> String {
    let digits = format!("{:010}", token);
    let tail = |n: usize| digits[digits.len() - n..].to_string();

    match kind {
        "email" => format!("test.user.{}@example.com", token),
        "phone" => format!("555{}", tail(7)),
        "ssn" => format!("123-45-{}", tail(4)),
        "zipcode" => tail(5),
        "name" => format!("TestUser{}", token),
        _ => format!("test_{}", token),
    }
}
