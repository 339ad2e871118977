//! Simple methods to track time during a long run and report progress and a
//! final summary. A multi-million step run reports throughput every couple of
//! seconds instead of staying silent for minutes.

use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use num_format::ToFormattedString;

use crate::{
    config::{user_locale, Config, StepBig},
    machine::Machine,
    status::RunStatus,
    utils::{duration_as_ms_rounded, file_exists},
};

const REPORT_PROGRESS_AFTER_DEFAULT: Duration = Duration::from_secs(2);

/// Tracks time and produces progress lines when due. \
/// Call [Self::is_due_progress] cheaply in the run loop and [Self::report]
/// only when it returns true; passing the parameters every iteration would
/// be needless work.
pub struct Reporter {
    start_time: Instant,
    last_progress_time: Instant,
    report_progress_after: Duration,
}

impl Reporter {
    pub fn new_default() -> Self {
        Self::new(REPORT_PROGRESS_AFTER_DEFAULT)
    }

    pub fn new(report_progress_after: Duration) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_progress_time: now,
            report_progress_after,
        }
    }

    pub fn is_due_progress(&self) -> bool {
        self.last_progress_time.elapsed() > self.report_progress_after
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Progress line with total steps and throughput since start.
    /// Resets the due timer.
    pub fn report(&mut self, steps: StepBig) -> String {
        let locale = user_locale();
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let steps_per_sec = if elapsed > 0.0 {
            (steps as f64 / elapsed) as u64
        } else {
            0
        };
        self.last_progress_time = Instant::now();
        format!(
            "Working: {} steps, {} steps/s",
            steps.to_formatted_string(&locale),
            steps_per_sec.to_formatted_string(&locale)
        )
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Final summary of one machine run for console output or a report file.
pub struct RunReport {
    machine_text: String,
    machine_id: u64,
    status: RunStatus,
    duration: Duration,
    use_local_time: bool,
}

impl RunReport {
    pub fn new(machine: &Machine, status: RunStatus, duration: Duration, config: &Config) -> Self {
        Self {
            machine_text: machine.to_standard_tm_text_format(),
            machine_id: machine.id(),
            status,
            duration,
            use_local_time: config.use_local_time(),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Appends the summary line to `sim_report.txt` in the given directory,
    /// creating the directory on first use. Callers usually pass
    /// `config.config_toml().report_out_path()`.
    pub fn write_to_file(&self, dir: &str) -> std::io::Result<()> {
        use std::io::Write;

        if !file_exists(dir) {
            std::fs::create_dir_all(dir)?;
        }
        let path = std::path::Path::new(dir).join("sim_report.txt");
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{self}")
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let timestamp = if self.use_local_time {
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
        } else {
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
        };
        write!(
            f,
            "{timestamp} ID {} {}: {} in {} ms",
            self.machine_id,
            self.machine_text,
            self.status,
            duration_as_ms_rounded(self.duration)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_resets_the_due_timer() {
        let mut reporter = Reporter::new(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(reporter.is_due_progress());
        let line = reporter.report(1_000_000);
        assert!(line.contains("1,000,000 steps"));
    }

    #[test]
    fn run_report_contains_machine_and_status() {
        let machine = Machine::build_machine("BB2_MAX").unwrap();
        let config = Config::new_default();
        let report = RunReport::new(
            &machine,
            RunStatus::HaltedDetail(6, 4),
            Duration::from_millis(3),
            &config,
        );
        let line = report.to_string();
        assert!(line.contains("1RB1LB_1LA1RZ"));
        assert!(line.contains("Halted after 6 steps"));
    }

    #[test]
    fn run_report_appends_to_the_report_file() {
        let machine = Machine::build_machine("BB2_MAX").unwrap();
        let config = Config::new_default();
        let report = RunReport::new(
            &machine,
            RunStatus::Halted(6),
            Duration::from_millis(1),
            &config,
        );
        let dir = std::env::temp_dir().join("bb_simulator_report_test");
        let dir = dir.to_str().unwrap();
        report.write_to_file(dir).unwrap();
        let content = std::fs::read_to_string(format!("{dir}/sim_report.txt")).unwrap();
        assert!(content.contains("1RB1LB_1LA1RZ"));
    }
}
