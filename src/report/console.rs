use crate::report::report_model::TestSuiteReport;
use crate::spec::spec_model::StepStatus;

// ============================================================================
// Console reporter
// ============================================================================

/// Format a suite report for terminal output.
///
/// ```text
/// === Test Suite: signup ===
///
/// ✓ PASS  signup [adult] (6 steps)
/// ✗ FAIL  signup [minor] (6 steps, 1 partial)
///     [PARTIAL] Step 3: select ~Residence: 'Mars' not offered, selected 'Texas'
///     [FAIL] Step 4: fill ~Zip: field not found
///
/// === Results: 1 passed, 1 failed (2 total) ===
/// ```
pub fn format_console_report(report: &TestSuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Test Suite: {} ===\n\n", report.suite_name));

    for result in &report.test_results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        let partial = result.partial_count();
        let partial_note = if partial > 0 {
            format!(", {} partial", partial)
        } else {
            String::new()
        };

        out.push_str(&format!(
            "{}  {} ({} steps{})\n",
            marker, result.spec_name, result.steps_run, partial_note
        ));

        for outcome in &result.step_outcomes {
            let tag = match outcome.status {
                StepStatus::Passed => continue,
                StepStatus::Partial => "PARTIAL",
                StepStatus::Failed => "FAIL",
            };
            out.push_str(&format!(
                "    [{}] Step {}: {}: {}\n",
                tag,
                outcome.index,
                outcome.action,
                outcome.detail.as_deref().unwrap_or("no detail")
            ));
        }

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        for artifact in &result.artifacts {
            out.push_str(&format!("    artifact: {}\n", artifact));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }

    out.push_str(" ===\n");
    out
}
