use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::driver::adapter::Selector;
use crate::locator::settings::LocatorSettings;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "mobile-locator",
    version,
    about = "Scroll-aware element location and form filling for Flutter apps on Android"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: mobile-locator.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Appium server URL, overrides the config file
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against a device through Appium
    Run {
        /// Scenario YAML file or directory of YAML files
        #[arg(long)]
        spec: String,

        /// Output format: console, html, junit
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run scenarios against a scripted screen, no device needed
    Simulate {
        /// Scenario YAML file or directory of YAML files
        #[arg(long)]
        spec: String,

        /// Scripted screen description (YAML)
        #[arg(long)]
        screen: String,

        /// Output format: console, html, junit
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Parse scenarios and print the expanded runs without executing them
    Check {
        #[arg(long)]
        spec: String,
    },

    /// Find an element on the live screen, scrolling as needed
    Locate {
        /// Selector candidates, most specific first
        #[arg(long = "target", required = true, num_args = 1..)]
        target: Vec<String>,

        /// Scroll attempts (default: locator.max_scroll_attempts)
        #[arg(long)]
        max_scrolls: Option<u32>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `mobile-locator.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub appium: AppiumConfig,
    #[serde(default)]
    pub locator: LocatorSettings,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppiumConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Passed as `alwaysMatch` when the session is created
    #[serde(default = "default_capabilities")]
    pub capabilities: Value,
}

impl Default for AppiumConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            capabilities: default_capabilities(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_console")]
    pub format: String,

    pub output: Option<String>,

    /// Where screenshots and page sources are written
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// JSONL file for locator state transitions; disabled when unset
    pub trace_file: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: default_console(),
            output: None,
            artifacts_dir: default_artifacts_dir(),
            trace_file: None,
        }
    }
}

/// Selectors whose visible matches count as validation messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub probes: Vec<Selector>,
}

fn default_server_url() -> String {
    "http://127.0.0.1:4723".to_string()
}
fn default_capabilities() -> Value {
    serde_json::json!({
        "platformName": "Android",
        "appium:automationName": "UiAutomator2"
    })
}
fn default_console() -> String {
    "console".to_string()
}
fn default_artifacts_dir() -> String {
    "screenshots".to_string()
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("mobile-locator.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = config_path, "ignoring malformed config: {}", e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}
