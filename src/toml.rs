//! Very basic functionality to read and write some configuration into a toml configuration file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfigToml {
    /// Directory the reporter writes run summaries into.
    #[serde(default = "default_report_out_path")]
    report_out_path: String,

    /// Local time in report lines; false uses UTC.
    #[serde(default = "default_report_local_time")]
    report_local_time: bool,

    /// Default step limit applied when no builder value is given.
    #[serde(default = "default_step_limit_run")]
    step_limit_run: u64,
}

impl ConfigToml {
    pub fn read_toml() -> ConfigToml {
        if Path::new(CONFIG_FILE).exists() {
            let config_content = fs::read_to_string(CONFIG_FILE)
                .expect("Config file {CONFIG_FILE} could not be read.");
            let config: ConfigToml = toml::from_str(&config_content)
                .expect("Config file {CONFIG_FILE} could not be parsed.");
            config
        } else {
            // No file is fine, the defaults cover everything; use
            // write_toml() to create an editable template.
            ConfigToml::default()
        }
    }

    pub fn report_out_path(&self) -> &str {
        &self.report_out_path
    }

    pub fn report_local_time(&self) -> bool {
        self.report_local_time
    }

    pub fn step_limit_run(&self) -> u64 {
        self.step_limit_run
    }

    /// Writes the current values as a config.toml next to the executable,
    /// e.g. to create a template the user can edit.
    pub fn write_toml(&self) -> std::io::Result<()> {
        let toml_string =
            toml::to_string_pretty(self).expect("Failed to serialize default config");
        fs::write(CONFIG_FILE, toml_string)
    }
}

impl Default for ConfigToml {
    fn default() -> Self {
        ConfigToml {
            report_out_path: default_report_out_path(),
            report_local_time: default_report_local_time(),
            step_limit_run: default_step_limit_run(),
        }
    }
}

fn default_report_out_path() -> String {
    "./sim_reports".to_string()
}

fn default_report_local_time() -> bool {
    true
}

fn default_step_limit_run() -> u64 {
    crate::config::STEP_LIMIT_DEFAULT
}
