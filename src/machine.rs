//! A single Turing Machine: a transition table with an id, plus convenience
//! constructors and run helpers for testing individual machines.

use std::fmt::Display;

use crate::{
    config::{Config, StepBig, StepSmall},
    error::ParseError,
    reporter::{Reporter, RunReport},
    run::MachineRun,
    status::RunStatus,
    tape::TapeKind,
    transition::TransitionTable,
};

/// Steps walked between progress-due checks in [Machine::run_halt_reported].
const REPORT_CHUNK_STEPS: StepBig = 1 << 20;

/// Turing Machine: one transition table under an id. The id is free-form,
/// e.g. an enumeration index or 0 for ad-hoc machines.
#[derive(Debug, Clone)]
pub struct Machine {
    id: u64,
    transition_table: TransitionTable,
}

impl Machine {
    pub fn new(id: u64, transition_table: TransitionTable) -> Self {
        Self {
            id,
            transition_table,
        }
    }

    /// Creates the machine from the Standard TM Text Format \
    /// <https://www.sligocki.com/2022/10/09/standard-tm-format.html>
    pub fn from_standard_tm_text_format(
        machine_id: u64,
        transitions_text: &str,
    ) -> Result<Self, ParseError> {
        let table = TransitionTable::from_standard_tm_text_format(transitions_text)?;
        Ok(Self::new(machine_id, table))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn n_states(&self) -> usize {
        self.transition_table.n_states()
    }

    pub fn n_symbols(&self) -> usize {
        self.transition_table.n_symbols()
    }

    pub fn transition_table(&self) -> &TransitionTable {
        &self.transition_table
    }

    pub fn to_standard_tm_text_format(&self) -> String {
        self.transition_table.to_standard_tm_text_format()
    }

    /// Runs this machine from the blank tape on the given backends until
    /// halt, fatal error, or the configured step limit. Returns the halted
    /// status with the non-zero cell count attached.
    /// This is a convenience for single machines; for many machines set up
    /// a [MachineRun] per machine and reuse the config.
    pub fn run_halt(&self, config: &Config, kinds: &[TapeKind]) -> RunStatus {
        let mut run = MachineRun::new(&self.transition_table, kinds, config);
        match run.run(config.step_limit_run()) {
            RunStatus::Halted(_) => run.status_full(),
            status => status,
        }
    }

    /// Like [Self::run_halt] on a single flat tape, additionally returning
    /// the non-zero count, for the common "steps and sigma" question.
    pub fn run_halt_with_nonzero(&self, config: &Config) -> (RunStatus, StepSmall) {
        let mut run = MachineRun::new(&self.transition_table, &[TapeKind::Flat], config);
        let status = run.run(config.step_limit_run());
        (status, run.count_nonzero())
    }

    /// [Self::run_halt] with console progress for multi-million step runs:
    /// throughput lines every couple of seconds and a final summary line.
    pub fn run_halt_reported(&self, config: &Config, kinds: &[TapeKind]) -> RunReport {
        let mut run = MachineRun::new(&self.transition_table, kinds, config);
        let mut reporter = Reporter::new_default();
        let mut remaining = config.step_limit_run();

        let mut status = RunStatus::UndecidedStepLimit(0);
        while remaining > 0 {
            let chunk = remaining.min(REPORT_CHUNK_STEPS);
            status = run.run(chunk);
            match status {
                RunStatus::UndecidedStepLimit(_) => {}
                _ => break,
            }
            remaining -= chunk;
            if reporter.is_due_progress() {
                println!("{}", reporter.report(run.steps()));
            }
        }
        if status.is_halted() {
            status = run.status_full();
        }

        let report = RunReport::new(self, status, reporter.start_time().elapsed(), config);
        println!("{report}");
        report
    }

    /// Some notable machines, usable for testing.
    /// The step/ones pairs in the comments are from the busy beaver corpus.
    pub fn build_machine(name: &str) -> Option<Self> {
        let (id, text) = match name.to_uppercase().as_str() {
            // 47,176,870 steps, 4098 ones
            "BB5_MAX" => (0, "1RB1LC_1RC1RB_1RD0LE_1LA1LD_1RZ0LA"),
            // 23,554,764 steps, 4097 ones
            "BB5_SECOND" => (1, "1RB0LD_1LC1RD_1LA1LC_1RZ1RE_1RA0RB"),
            // 107 steps, 13 ones
            "BB4_MAX" => (191_658_921, "1RB1LB_1LA0LC_1RZ1LD_1RD0RA"),
            // 21 steps, 5 ones
            "BB3_MAX" => (651_320, "1RB1RZ_1LB0RC_1LC1LA"),
            // 17 steps, 4 ones; halts via an undefined cell row
            "BB3_UNDEF" => (0, "1RB1RZ_0RC---_1LC0LA"),
            // 6 steps, 4 ones
            "BB2_MAX" => (0, "1RB1LB_1LA1RZ"),
            // 3,932,964 steps, 2050 ones
            "BB2X4_MAX" => (0, "1RB2LA1RA1RA_1LB1LA3RB1RZ"),
            // 38 steps, 9 ones
            "BB2X3_MAX" => (0, "1RB2LB1RZ_2LA2RB1LB"),
            // endless, writes nothing
            "ENDLESS" => (0, "0RA"),
            _ => return None,
        };
        // The corpus texts are well-formed by construction
        Some(Self::from_standard_tm_text_format(id, text).unwrap())
    }
}

impl TryFrom<&str> for Machine {
    type Error = ParseError;

    fn try_from(transitions_text: &str) -> Result<Self, Self::Error> {
        Self::from_standard_tm_text_format(0, transitions_text)
    }
}

impl Display for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID: {} {}", self.id, self.to_standard_tm_text_format())
    }
}
