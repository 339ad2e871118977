//! Macro-machine encoder: compiles a base machine of scale k into a machine
//! whose single step simulates up to k micro-steps over a run of k
//! micro-cells.
//!
//! A macro symbol packs k base symbols as bits, the leftmost micro-cell in
//! the most significant bit. A macro state packs `(base_state, entry
//! direction)` with the direction in the lowest bit, so `n_states` doubles
//! and `n_symbols` becomes 2^k. Each macro instruction is determined by an
//! inner simulation on a flat tape of k + 2 cells (one guard cell per side)
//! which runs until the base machine halts or its head escapes the macro
//! cell.

use crate::{
    config::{CellType, Config, DirType, PosType, StateType, StepBig},
    error::MacroEncodeError,
    run::MachineRun,
    tape::{tape_cmp, tape_cmp::TapeCmp, tape_flat::FlatTape, Tape, TapeBackend},
    transition::{Instruction, TransitionTable, DIR_LEFT, DIR_RIGHT, STATE_HALT},
};

/// Highest supported scale factor. One bit of the cell width is reserved so
/// macro symbol values stay clear of the undefined-cell marker.
pub const MACRO_SCALE_MAX: usize = crate::config::MAX_SYM_BITS - 1;

/// The start state of an encoded macro machine: base state A entering its
/// first macro cell moving rightward.
pub const MACRO_STATE_START: StateType = DIR_RIGHT as StateType;

/// Builds the full macro transition table for the given scale: one directed
/// macro instruction per `(macro_state, macro_symbol)` pair. Fails when the
/// base machine has other than two symbols, or when any inner simulation
/// neither halts nor escapes (cycle detected or budget exceeded).
pub fn encode_macro_table(
    table: &TransitionTable,
    scale: usize,
    config: &Config,
) -> Result<TransitionTable, MacroEncodeError> {
    if table.n_symbols() != 2 {
        return Err(MacroEncodeError::UnsupportedSymbolCount {
            n_symbols: table.n_symbols(),
        });
    }
    if !(1..=MACRO_SCALE_MAX).contains(&scale) {
        return Err(MacroEncodeError::UnsupportedScale {
            scale,
            max_scale: MACRO_SCALE_MAX,
        });
    }

    let n_macro_symbols = 1usize << scale;
    let n_macro_states = table.n_states() * 2;
    let mut macro_table = TransitionTable::new(n_macro_symbols, n_macro_states);

    for macro_state in 0..n_macro_states {
        for macro_symbol in 0..n_macro_symbols {
            let macro_state = macro_state as StateType;
            let macro_symbol = macro_symbol as CellType;
            let instr =
                determine_macro_instruction(table, scale, macro_state, macro_symbol, config)?;
            macro_table.store(macro_state, macro_symbol, instr);
        }
    }

    Ok(macro_table)
}

/// Checks whether an inner head position lies outside the macro cell. The
/// thresholds depend on the entry direction because the starting cell itself
/// does: relative position 0 is the leftmost micro-cell when entering
/// rightward and the rightmost when entering leftward.
fn escaped(entry_dir: DirType, scale: usize, rel_pos: PosType) -> Option<DirType> {
    let scale = scale as PosType;
    if (entry_dir == DIR_LEFT && rel_pos <= -scale) || (entry_dir == DIR_RIGHT && rel_pos <= -1) {
        return Some(DIR_LEFT);
    }
    if (entry_dir == DIR_RIGHT && rel_pos >= scale) || (entry_dir == DIR_LEFT && rel_pos >= 1) {
        return Some(DIR_RIGHT);
    }
    None
}

/// A fresh inner run: flat tape of scale + 2 cells whose positions 1..=scale
/// hold the bits of the macro symbol with the leftmost micro-cell at
/// position 1, head on the entry cell, base state of the macro state.
fn inner_run<'a>(
    table: &'a TransitionTable,
    scale: usize,
    macro_state: StateType,
    macro_symbol: CellType,
    config: &Config,
) -> MachineRun<'a> {
    let entry_dir = (macro_state & 1) as DirType;
    let init_pos = if entry_dir == DIR_LEFT { scale } else { 1 } as PosType;
    let mut tape = FlatTape::new(scale + 2, init_pos, table.sym_bits());
    for i in 0..scale {
        // Bit i of the macro symbol is the base symbol at micro-position
        // scale - i, so the bits "look" right on the tape.
        let micro_symbol = (macro_symbol >> i) & 1;
        tape.set_cell(scale - i, micro_symbol);
    }
    let mut run = MachineRun::with_tapes(table, vec![TapeBackend::Flat(tape)], config);
    run.set_state(macro_state >> 1);
    run
}

/// Determines one macro instruction by stepping the base machine inside the
/// macro cell until it halts or escapes. A slow/fast run pair detects inner
/// cycles; the configured budget bounds everything else.
fn determine_macro_instruction(
    table: &TransitionTable,
    scale: usize,
    macro_state: StateType,
    macro_symbol: CellType,
    config: &Config,
) -> Result<Instruction, MacroEncodeError> {
    let entry_dir = (macro_state & 1) as DirType;
    let step_limit = config.macro_inner_step_limit();

    let mut slow = inner_run(table, scale, macro_state, macro_symbol, config);
    let mut fast = inner_run(table, scale, macro_state, macro_symbol, config);
    // Once the fast run halts or escapes, the slow run is headed for the
    // same exit and a cycle is impossible; only the budget remains.
    let mut fast_live = true;

    let exit_dir = loop {
        if slow.is_halted() {
            break DIR_RIGHT; // value does not matter, the out state is halting
        }
        if let Some(dir) = escaped(entry_dir, scale, slow.tape(0).rel_pos()) {
            break dir;
        }
        if slow.steps() >= step_limit as StepBig {
            return Err(MacroEncodeError::InnerStepLimit {
                macro_state,
                macro_symbol,
                step_limit,
            });
        }
        slow.step();

        if fast_live {
            for _ in 0..2 {
                if fast.is_halted()
                    || escaped(entry_dir, scale, fast.tape(0).rel_pos()).is_some()
                {
                    fast_live = false;
                    break;
                }
                fast.step();
            }
            // Equal configurations with the fast run ahead prove a cycle
            if fast_live
                && !slow.is_halted()
                && slow.state() == fast.state()
                && tape_cmp::cmp_windowed(slow.tape(0), fast.tape(0), (scale + 2) as PosType)
                    == TapeCmp::Equal
            {
                return Err(MacroEncodeError::InnerCycle {
                    macro_state,
                    macro_symbol,
                });
            }
        }
    };

    // Read the micro-cells back out in the same bit ordering
    let tape = slow
        .tape(0)
        .as_flat()
        .expect("inner run always uses a flat tape");
    let mut out_symbol: CellType = 0;
    for i in 0..scale {
        out_symbol |= tape.cell(scale - i) << i;
    }

    let state_next = if slow.is_halted() {
        STATE_HALT
    } else {
        (slow.state() << 1) | exit_dir as StateType
    };

    Ok(Instruction {
        symbol_write: out_symbol,
        direction: exit_dir,
        state_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{status::RunStatus, tape::TapeKind};

    fn table(text: &str) -> TransitionTable {
        TransitionTable::from_standard_tm_text_format(text).unwrap()
    }

    #[test]
    fn scale_1_packs_directed_states() {
        let base = table("1RB1LB_1LA1RZ");
        let config = Config::new_default();
        let macro_table = encode_macro_table(&base, 1, &config).unwrap();
        assert_eq!(2, macro_table.n_symbols());
        assert_eq!(4, macro_table.n_states());

        // (A, entering rightward) on a blank cell: A0 writes 1 and leaves
        // rightward into state B, so the macro cell ends as 1 and the next
        // macro state packs (B, RIGHT).
        let instr = macro_table.lookup(MACRO_STATE_START, 0);
        assert_eq!(1, instr.symbol_write);
        assert_eq!(DIR_RIGHT, instr.direction);
        assert_eq!((1 << 1) | DIR_RIGHT as StateType, instr.state_next);
    }

    #[test]
    fn scale_2_macro_run_reproduces_the_base_tape() {
        // BB2 max: halts after 6 steps with 4 ones
        let base = table("1RB1LB_1LA1RZ");
        let config = Config::new_default();
        let macro_table = encode_macro_table(&base, 2, &config).unwrap();
        assert_eq!(4, macro_table.n_symbols());
        assert_eq!(4, macro_table.n_states());

        let mut run = MachineRun::new(&macro_table, &[TapeKind::Flat], &config);
        run.set_state(MACRO_STATE_START);
        let status = run.run(1_000);
        assert!(status.is_halted(), "macro machine did not halt: {status}");

        // Each macro cell packs 2 micro-cells; the micro ones survive intact
        let mut micro_ones = 0;
        for pos in -16..=16 {
            micro_ones += run.tape(0).read_at(pos).count_ones();
        }
        assert_eq!(4, micro_ones);
    }

    #[test]
    fn scale_3_keeps_the_ones_count() {
        let base = table("1RB1LB_1LA1RZ");
        let config = Config::new_default();
        let macro_table = encode_macro_table(&base, 3, &config).unwrap();
        assert_eq!(8, macro_table.n_symbols());
        assert_eq!(4, macro_table.n_states());

        let mut run = MachineRun::new(&macro_table, &[TapeKind::Flat], &config);
        run.set_state(MACRO_STATE_START);
        let status = run.run(10_000);
        assert!(status.is_halted(), "macro machine did not halt: {status}");

        let mut micro_ones = 0;
        for pos in -16..=16 {
            micro_ones += run.tape(0).read_at(pos).count_ones();
        }
        assert_eq!(4, micro_ones);
    }

    #[test]
    fn inner_cycle_is_reported() {
        // A0/B0 shuttle the head between two cells forever without writing
        let base = table("0RB---_0LA---");
        let config = Config::new_default();
        let result = encode_macro_table(&base, 2, &config);
        assert!(matches!(
            result,
            Err(MacroEncodeError::InnerCycle { .. })
        ));
    }

    #[test]
    fn inner_step_limit_is_reported() {
        let base = table("1RB1LB_1LA1RZ");
        let config = Config::builder().macro_inner_step_limit(1).build();
        let result = encode_macro_table(&base, 2, &config);
        assert!(matches!(
            result,
            Err(MacroEncodeError::InnerStepLimit { step_limit: 1, .. })
        ));
    }

    #[test]
    fn non_two_symbol_base_is_rejected() {
        let base = table("1RB2LB1RZ_2LA2RB1LB");
        let config = Config::new_default();
        assert_eq!(
            Err(MacroEncodeError::UnsupportedSymbolCount { n_symbols: 3 }),
            encode_macro_table(&base, 2, &config)
        );
    }

    #[test]
    fn unhalting_macro_run_exhausts_its_budget() {
        let base = table("0RB---_0LA---");
        let config = Config::new_default();
        // scale 1 cells never trap the head, so encoding succeeds
        let macro_table = encode_macro_table(&base, 1, &config).unwrap();
        let mut run = MachineRun::new(&macro_table, &[TapeKind::Rle], &config);
        run.set_state(MACRO_STATE_START);
        assert_eq!(RunStatus::UndecidedStepLimit(100), run.run(100));
    }
}
