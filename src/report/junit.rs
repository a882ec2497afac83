use crate::report::report_model::TestSuiteReport;
use crate::spec::spec_model::StepStatus;

// ============================================================================
// JUnit XML reporter
// ============================================================================

/// Generate JUnit XML for CI systems.
///
/// One `<testcase>` per scenario run. Failed steps and execution errors go
/// into the `<failure>` body; partial steps are reported as `<system-out>`
/// so they show up without failing the build.
pub fn generate_junit_xml(report: &TestSuiteReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cases = String::new();
    for result in &report.test_results {
        let name = escape_xml(&result.spec_name);

        let partial: Vec<String> = result
            .step_outcomes
            .iter()
            .filter(|o| o.status == StepStatus::Partial)
            .map(|o| {
                format!(
                    "Step {} {}: {}",
                    o.index,
                    o.action,
                    o.detail.as_deref().unwrap_or("partial")
                )
            })
            .collect();
        let system_out = if partial.is_empty() {
            String::new()
        } else {
            format!(
                "    <system-out>{}</system-out>\n",
                escape_xml(&partial.join("\n"))
            )
        };

        if result.passed {
            if system_out.is_empty() {
                cases.push_str(&format!(
                    "  <testcase name=\"{}\" classname=\"mobile-locator\" />\n",
                    name
                ));
            } else {
                cases.push_str(&format!(
                    "  <testcase name=\"{}\" classname=\"mobile-locator\">\n{}  </testcase>\n",
                    name, system_out
                ));
            }
            continue;
        }

        let mut body_parts: Vec<String> = result
            .failed_steps()
            .map(|o| {
                format!(
                    "Step {} {}: {}",
                    o.index,
                    o.action,
                    o.detail.as_deref().unwrap_or("failed")
                )
            })
            .collect();
        let failure_count = body_parts.len();
        if let Some(ref error) = result.error {
            body_parts.push(format!("Error: {}", error));
        }

        let (message, kind) = if result.error.is_some() {
            ("execution error".to_string(), "ExecutionError")
        } else {
            (format!("{} step(s) failed", failure_count), "StepFailure")
        };

        cases.push_str(&format!(
            "  <testcase name=\"{name}\" classname=\"mobile-locator\">\n    <failure message=\"{message}\" type=\"{kind}\">{body}</failure>\n{system_out}  </testcase>\n",
            name = name,
            message = escape_xml(&message),
            kind = kind,
            body = escape_xml(&body_parts.join("\n")),
            system_out = system_out,
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&report.suite_name),
        tests = report.total,
        failures = report.failed,
        time = time_attr,
        cases = cases,
    )
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
