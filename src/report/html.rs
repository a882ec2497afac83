use crate::report::report_model::TestSuiteReport;
use crate::spec::spec_model::StepStatus;

// ============================================================================
// HTML reporter: single self-contained page
// ============================================================================

/// Generate a self-contained HTML report with inline CSS.
///
/// Each run gets its own card listing every step with its status, so partial
/// steps (fallback dropdown choices) stay visible even on passing runs.
pub fn generate_html_report(report: &TestSuiteReport) -> String {
    let (header_color, status_text) = if report.all_passed() {
        ("#4CAF50", "ALL SCENARIOS PASSED")
    } else {
        ("#f44336", "SOME SCENARIOS FAILED")
    };

    let duration_text = report
        .duration_ms
        .map(|ms| format!(" in {:.1}s", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cards = String::new();
    for result in &report.test_results {
        let (class, marker) = if result.passed {
            ("pass", "\u{2713}")
        } else {
            ("fail", "\u{2717}")
        };

        cards.push_str(&format!(
            "<div class=\"test-case {class}\">\n<h3>{marker} {name}</h3>\n<p>Steps run: {steps} | Partial: {partial}</p>\n",
            class = class,
            marker = marker,
            name = escape_html(&result.spec_name),
            steps = result.steps_run,
            partial = result.partial_count(),
        ));

        if let Some(ref error) = result.error {
            cards.push_str(&format!(
                "<p class=\"error\">Error: {}</p>\n",
                escape_html(error)
            ));
        }

        if !result.step_outcomes.is_empty() {
            cards.push_str("<ol class=\"steps\" start=\"0\">\n");
            for outcome in &result.step_outcomes {
                let status = match outcome.status {
                    StepStatus::Passed => "passed",
                    StepStatus::Partial => "partial",
                    StepStatus::Failed => "failed",
                };
                cards.push_str(&format!(
                    "<li class=\"{status}\"><code>{action}</code> {detail}</li>\n",
                    status = status,
                    action = escape_html(&outcome.action),
                    detail = escape_html(outcome.detail.as_deref().unwrap_or("")),
                ));
            }
            cards.push_str("</ol>\n");
        }

        if !result.artifacts.is_empty() {
            cards.push_str("<ul class=\"artifacts\">\n");
            for artifact in &result.artifacts {
                let artifact = escape_html(artifact);
                cards.push_str(&format!(
                    "<li><a href=\"{0}\">{0}</a></li>\n",
                    artifact
                ));
            }
            cards.push_str("</ul>\n");
        }

        cards.push_str("</div>\n");
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{suite_name} - Scenario Report</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 0; background: #f5f5f5; }}
.header {{ background: {header_color}; color: white; padding: 20px 30px; }}
.header h1 {{ margin: 0 0 8px 0; font-size: 24px; }}
.header p {{ margin: 0; font-size: 16px; opacity: 0.9; }}
.content {{ max-width: 900px; margin: 20px auto; padding: 0 20px; }}
.test-case {{ background: white; border-radius: 6px; padding: 16px 20px; margin-bottom: 12px; border-left: 4px solid #ccc; }}
.test-case.pass {{ border-left-color: #4CAF50; }}
.test-case.fail {{ border-left-color: #f44336; }}
.test-case h3 {{ margin: 0 0 8px 0; font-size: 16px; }}
.test-case p {{ margin: 4px 0; color: #666; font-size: 14px; }}
.test-case .error {{ color: #f44336; font-weight: bold; }}
.steps {{ margin: 8px 0 0 0; padding-left: 28px; font-size: 13px; }}
.steps li {{ margin-bottom: 3px; }}
.steps li.passed {{ color: #2e7d32; }}
.steps li.partial {{ color: #ef6c00; }}
.steps li.failed {{ color: #c62828; font-weight: bold; }}
.artifacts {{ font-size: 12px; }}
</style>
</head>
<body>
<div class="header">
<h1>{status_text}</h1>
<p>{suite_name}: {passed} passed, {failed} failed ({total} total), {partial} partial step(s){duration}</p>
</div>
<div class="content">
{cards}
</div>
</body>
</html>"##,
        suite_name = escape_html(&report.suite_name),
        header_color = header_color,
        status_text = status_text,
        passed = report.passed,
        failed = report.failed,
        total = report.total,
        partial = report.partial_steps,
        duration = duration_text,
        cards = cards,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
