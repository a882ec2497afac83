use std::path::Path;

use tracing::{info, warn};

use crate::cli::config::AppConfig;
use crate::driver::adapter::{Driver, Selector};
use crate::driver::appium::AppiumDriver;
use crate::driver::scripted::{ScriptedDriver, ScriptedScreen};
use crate::locator::Locator;
use crate::report::console::format_console_report;
use crate::report::html::generate_html_report;
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::TestSuiteReport;
use crate::spec::runner::ScenarioRunner;
use crate::spec::spec_model::{ScenarioSpec, TestResult};
use crate::trace::artifacts::ArtifactSink;
use crate::trace::logger::TraceLogger;

// ============================================================================
// run subcommand
// ============================================================================

/// Run scenarios on a device through Appium and return whether all passed.
pub fn cmd_run(
    spec_path: &str,
    format: Option<&str>,
    output: Option<&str>,
    server: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scenarios = load_specs(spec_path)?;
    if scenarios.is_empty() {
        eprintln!("No scenarios found at: {}", spec_path);
        return Ok(true);
    }

    let server = server.unwrap_or(&config.appium.server_url);
    let mut driver = AppiumDriver::connect(server, &config.appium.capabilities)?;

    let start = std::time::Instant::now();
    let results = run_scenarios(&mut driver, &scenarios, config);
    let duration = start.elapsed().as_millis();

    // The report goes out before the session is closed: a lost session
    // fails the quit too, and the failed runs still need reporting.
    let passed = write_report("Appium run", results, duration, format, output, config);
    close_session(&mut driver);
    passed
}

// ============================================================================
// simulate subcommand
// ============================================================================

/// Run scenarios against a scripted screen and return whether all passed.
pub fn cmd_simulate(
    spec_path: &str,
    screen_path: &str,
    format: Option<&str>,
    output: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scenarios = load_specs(spec_path)?;
    if scenarios.is_empty() {
        eprintln!("No scenarios found at: {}", spec_path);
        return Ok(true);
    }

    let screen = ScriptedScreen::from_yaml(&std::fs::read_to_string(screen_path)?)?;

    let start = std::time::Instant::now();
    let mut results = Vec::new();
    // Every scenario starts from a fresh screen, the way a relaunched app would.
    for scenario in &scenarios {
        let mut driver = ScriptedDriver::new(screen.clone());
        results.extend(run_scenarios(&mut driver, std::slice::from_ref(scenario), config));
    }
    let duration = start.elapsed().as_millis();

    write_report("Simulated run", results, duration, format, output, config)
}

// ============================================================================
// check subcommand
// ============================================================================

/// Parse and expand scenarios, printing every run and its steps.
pub fn cmd_check(spec_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let scenarios = load_specs(spec_path)?;
    let mut total_runs = 0;

    for scenario in &scenarios {
        for run in scenario.runs() {
            total_runs += 1;
            println!("{} ({} steps)", run.name, run.steps.len());
            for (i, step) in run.steps.iter().enumerate() {
                println!("  {:>2}. {}", i, step.describe());
            }
        }
    }

    println!(
        "{} scenario file(s), {} run(s)",
        scenarios.len(),
        total_runs
    );
    Ok(())
}

// ============================================================================
// locate subcommand
// ============================================================================

/// Look up an element on the live screen. Returns whether it was found.
pub fn cmd_locate(
    targets: &[String],
    max_scrolls: Option<u32>,
    server: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let candidates = Selector::parse_all(targets)?;
    let server = server.unwrap_or(&config.appium.server_url);
    let mut driver = AppiumDriver::connect(server, &config.appium.capabilities)?;

    let search = {
        let mut locator = Locator::new(&mut driver, config.locator.clone());
        let max = max_scrolls.unwrap_or(config.locator.max_scroll_attempts);
        locator.locate_with_scroll_max(&candidates, max)
    };
    close_session(&mut driver);
    let search = search?;

    match search.located {
        Some(located) => {
            println!(
                "found {} (candidate {}) after {} scroll(s)",
                located.selector,
                located.candidate_index,
                search.state.attempts_made
            );
            Ok(true)
        }
        None => {
            println!(
                "not found after {} scroll(s){}",
                search.state.attempts_made,
                if search.state.gesture_failed {
                    ", scroll gesture failed"
                } else {
                    ""
                }
            );
            Ok(false)
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn close_session(driver: &mut AppiumDriver) {
    if let Err(e) = driver.quit() {
        warn!(error = %e, "failed to close Appium session");
    }
}

fn run_scenarios(
    driver: &mut dyn Driver,
    scenarios: &[ScenarioSpec],
    config: &AppConfig,
) -> Vec<TestResult> {
    let artifacts = ArtifactSink::new(&config.run.artifacts_dir);
    let trace = match config.run.trace_file {
        Some(ref path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let mut locator = Locator::new(driver, config.locator.clone())
        .with_trace(&trace)
        .with_artifacts(&artifacts);
    let runner = ScenarioRunner::new()
        .with_artifacts(&artifacts)
        .with_validation_probes(config.validation.probes.clone());

    let mut results = Vec::new();
    for scenario in scenarios {
        info!(scenario = %scenario.name, runs = scenario.runs().len(), "running scenario");
        results.extend(runner.run_all(scenario, &mut locator));
    }
    results
}

fn write_report(
    suite_name: &str,
    results: Vec<TestResult>,
    duration_ms: u128,
    format: Option<&str>,
    output: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let report = TestSuiteReport::from_results(suite_name, results).with_duration(duration_ms);
    let all_passed = report.all_passed();

    let format = format.unwrap_or(&config.run.format);
    let content = match format {
        "html" => generate_html_report(&report),
        "junit" => generate_junit_xml(&report),
        _ => format_console_report(&report),
    };

    match output.or(config.run.output.as_deref()) {
        Some(path) => {
            std::fs::write(path, &content)?;
            info!(path, "report written");
        }
        None => print!("{}", content),
    }

    Ok(all_passed)
}

/// Load scenarios from a single YAML file or a directory of YAML files.
pub fn load_specs(path: &str) -> Result<Vec<ScenarioSpec>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_dir() {
        return Ok(vec![parse_spec_file(Path::new(path))?]);
    }

    let mut scenarios = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let p = entry?.path();
        if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            scenarios.push(parse_spec_file(&p)?);
        }
    }
    // Sort by name for deterministic order
    scenarios.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scenarios)
}

fn parse_spec_file(path: &Path) -> Result<ScenarioSpec, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content)
        .map_err(|e| format!("{}: {}", path.display(), e).into())
}
