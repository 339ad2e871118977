//! The stepping driver: fetch/decode/write/move across 1..3 lockstep tapes,
//! halt detection, step budget, and the cross-check between backends.
//!
//! Every step reads from each attached tape (they must agree, the tables
//! driving them are identical), performs one table lookup, writes the
//! instruction's symbol to every tape, moves every head, and advances the
//! state. A step that transitions to halt is counted.

use std::fmt::Display;

use crate::{
    config::{Config, PosType, StateType, StepBig, StepSmall},
    status::{AbortReason, RunStatus},
    tape::{
        tape_cmp::{cmp_backends, TapeCmp},
        Tape, TapeBackend, TapeKind,
    },
    transition::TransitionTable,
};

/// Maximum number of lockstep tape slots.
pub const MAX_TAPES: usize = 3;

/// One execution of a machine from the blank tape: owns its tapes and step
/// counter, borrows the transition table read-only. The same table can drive
/// any number of runs sequentially.
pub struct MachineRun<'a> {
    table: &'a TransitionTable,
    tapes: Vec<TapeBackend>,
    state: StateType,
    steps: StepBig,
    status: RunStatus,
    cross_check_interval: StepSmall,
    cmp_window_cells: PosType,
}

impl<'a> MachineRun<'a> {
    /// A fresh run in state A on blank tapes, one per requested kind.
    pub fn new(table: &'a TransitionTable, kinds: &[TapeKind], config: &Config) -> Self {
        let tapes = kinds
            .iter()
            .map(|&kind| TapeBackend::new(kind, table.sym_bits(), config))
            .collect();
        Self::with_tapes(table, tapes, config)
    }

    /// A fresh run over pre-built tapes, e.g. a tape with preset contents for
    /// the macro encoder.
    pub fn with_tapes(
        table: &'a TransitionTable,
        tapes: Vec<TapeBackend>,
        config: &Config,
    ) -> Self {
        assert!((1..=MAX_TAPES).contains(&tapes.len()));
        Self {
            table,
            tapes,
            state: 0,
            steps: 0,
            status: RunStatus::Running,
            cross_check_interval: config.cross_check_interval(),
            cmp_window_cells: config.cmp_window_cells(),
        }
    }

    pub fn table(&self) -> &TransitionTable {
        self.table
    }

    pub fn state(&self) -> StateType {
        self.state
    }

    /// Overrides the current state, e.g. to start an inner simulation in the
    /// base state of a macro cell.
    pub fn set_state(&mut self, state: StateType) {
        self.state = state;
    }

    pub fn steps(&self) -> StepBig {
        self.steps
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.table.is_halt_state(self.state)
    }

    pub fn n_tapes(&self) -> usize {
        self.tapes.len()
    }

    pub fn tape(&self, slot: usize) -> &TapeBackend {
        &self.tapes[slot]
    }

    pub fn tape_mut(&mut self, slot: usize) -> &mut TapeBackend {
        &mut self.tapes[slot]
    }

    /// Non-zero cells on the first tape (all tapes agree while the run is
    /// healthy).
    pub fn count_nonzero(&self) -> StepSmall {
        self.tapes[0].count_nonzero()
    }

    /// Like [Self::status] but with the non-zero cell count attached to a
    /// halted result.
    pub fn status_full(&self) -> RunStatus {
        match self.status {
            RunStatus::Halted(steps) => RunStatus::HaltedDetail(steps, self.count_nonzero()),
            status => status,
        }
    }

    /// Runs one step.
    /// # Returns
    /// True when the run ended (halt or fatal error), see [Self::status].
    pub fn step(&mut self) -> bool {
        assert!(!self.is_halted(), "trying to step a halted machine");
        assert!(
            !self.status.is_aborted(),
            "trying to step an aborted machine"
        );

        // Read from every attached tape; any disagreement is a correctness
        // bug in a backend and ends the run loudly.
        let symbol = self.tapes[0].read_symbol();
        for tape in &self.tapes[1..] {
            if tape.read_symbol() != symbol {
                self.status = RunStatus::Aborted(
                    self.steps,
                    AbortReason::TapeMismatch(self.tapes[0].rel_pos()),
                );
                return true;
            }
        }

        let instr = self.table.lookup(self.state, symbol);
        let delta = instr.delta();

        #[cfg(feature = "debug_step")]
        println!(
            "Step {:5} state {:2} read {symbol}: {instr} | {}",
            self.steps + 1,
            self.state,
            self.tapes[0]
        );

        for tape in &mut self.tapes {
            tape.write_symbol(instr.symbol_to_write());
            if !tape.move_head(delta) {
                self.status = RunStatus::Aborted(self.steps, AbortReason::TapeBoundReached);
                return true;
            }
        }

        self.state = instr.state_next;
        self.steps += 1;

        if self.is_halted() {
            self.status = RunStatus::Halted(self.steps);
            return true;
        }

        if self.cross_check_interval > 0
            && self.tapes.len() > 1
            && self.steps % self.cross_check_interval as StepBig == 0
            && self.cross_check()
        {
            return true;
        }

        false
    }

    /// Compares all attached tape pairs; on a mismatch the run is aborted.
    /// # Returns
    /// True if a mismatch ended the run.
    pub fn cross_check(&mut self) -> bool {
        for i in 0..self.tapes.len() {
            for j in i + 1..self.tapes.len() {
                match cmp_backends(&self.tapes[i], &self.tapes[j], self.cmp_window_cells) {
                    TapeCmp::Equal => {}
                    TapeCmp::DiffHead => {
                        self.status =
                            RunStatus::Aborted(self.steps, AbortReason::TapeMismatchHead);
                        return true;
                    }
                    TapeCmp::DiffAt(pos) => {
                        self.status =
                            RunStatus::Aborted(self.steps, AbortReason::TapeMismatch(pos));
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Runs until halt, fatal error, or `max_steps` further steps have been
    /// walked. `max_steps` counts from this invocation, not cumulatively, so
    /// a budget-exhausted run can be continued with another call.
    pub fn run(&mut self, max_steps: StepBig) -> RunStatus {
        for _ in 0..max_steps {
            if self.step() {
                return self.status;
            }
        }
        // Not an error and deliberately not recorded in self.status: the
        // machine is still running.
        RunStatus::UndecidedStepLimit(self.steps)
    }
}

impl Display for MachineRun<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "step {} state {} {}: {}",
            self.steps, self.state, self.status, self.tapes[0]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::tape_flat::FlatTape;

    fn table(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text_format(text).unwrap()
    }

    #[test]
    fn machine_bb2_max_halts_after_6_steps() {
        let table = table("1RB1LB_1LA1RZ");
        let config = Config::new_default();
        let mut run = MachineRun::new(&table, &[TapeKind::Flat], &config);
        let status = run.run(100);
        assert_eq!(RunStatus::Halted(6), status);
        assert_eq!(RunStatus::HaltedDetail(6, 4), run.status_full());
    }

    #[test]
    fn machine_bb3_max_in_lockstep_on_all_backends() {
        let table = table("1RB1RZ_1LB0RC_1LC1LA");
        let config = Config::builder().cross_check_interval(1).build();
        let mut run = MachineRun::new(
            &table,
            &[TapeKind::Bit, TapeKind::Flat, TapeKind::Rle],
            &config,
        );
        let status = run.run(1_000);
        assert_eq!(RunStatus::Halted(21), status);
        for slot in 0..run.n_tapes() {
            assert_eq!(5, run.tape(slot).count_nonzero());
        }
    }

    #[test]
    fn budget_exhaustion_is_resumable() {
        let table = table("1RB1LB_1LA1RZ");
        let config = Config::new_default();
        let mut run = MachineRun::new(&table, &[TapeKind::Rle], &config);
        assert_eq!(RunStatus::UndecidedStepLimit(4), run.run(4));
        assert_eq!(RunStatus::Running, run.status());
        // remaining 2 steps of the 6-step run
        assert_eq!(RunStatus::Halted(6), run.run(100));
    }

    #[test]
    fn halting_step_is_counted() {
        let table = table("1RB1RB_1LA---");
        let config = Config::new_default();
        let mut run = MachineRun::new(&table, &[TapeKind::Flat], &config);
        assert_eq!(RunStatus::Halted(4), run.run(100));
        assert!(run.is_halted());
    }

    #[test]
    #[should_panic(expected = "trying to step a halted machine")]
    fn stepping_a_halted_machine_panics() {
        let table = table("1RB1RB_1LA---");
        let config = Config::new_default();
        let mut run = MachineRun::new(&table, &[TapeKind::Flat], &config);
        let _ = run.run(100);
        run.step();
    }

    #[test]
    fn bit_tape_bound_aborts_the_run() {
        // writes blank and runs right forever
        let table = table("0RA");
        let config = Config::builder().tape_size_bit_cells(8).build();
        let mut run = MachineRun::new(&table, &[TapeKind::Bit], &config);
        let status = run.run(1_000);
        assert!(matches!(
            status,
            RunStatus::Aborted(_, AbortReason::TapeBoundReached)
        ));
        assert_eq!(status, run.status());
    }

    #[test]
    fn read_disagreement_aborts_the_run() {
        let table = table("1RB1LB_1LA1RZ");
        let config = Config::new_default();
        // one healthy blank tape and one with a stray symbol under the head
        let mut bad = FlatTape::new(16, 8, 1);
        bad.set_cell(8, 1);
        let tapes = vec![
            TapeBackend::new(TapeKind::Rle, table.sym_bits(), &config),
            TapeBackend::Flat(bad),
        ];
        let mut run = MachineRun::with_tapes(&table, tapes, &config);
        assert!(run.step());
        assert!(matches!(
            run.status(),
            RunStatus::Aborted(0, AbortReason::TapeMismatch(0))
        ));
    }

    #[test]
    fn cross_check_catches_divergence_behind_the_head() {
        let table = table("1RB1LB_1LA1RZ");
        let config = Config::builder().cross_check_interval(2).build();
        let mut run = MachineRun::new(&table, &[TapeKind::Flat, TapeKind::Flat], &config);
        // run two healthy steps, then corrupt a cell away from the head
        assert!(!run.step());
        assert!(!run.step());
        if let TapeBackend::Flat(tape) = run.tape_mut(1) {
            let mem_pos = (tape.init_pos() + tape.rel_pos()) as usize;
            // the cell right of the head holds a 1 after two steps
            tape.set_cell(mem_pos + 1, 0);
        }
        assert!(run.cross_check());
        assert!(run.status().is_aborted());
    }
}
