pub mod packed_buffer;
pub mod tape_bit;
pub mod tape_cmp;
pub mod tape_flat;
pub mod tape_rle;

use std::fmt::Display;

use crate::{
    config::{CellType, Config, MoveType, PosType, StepSmall},
    tape::{tape_bit::BitTape, tape_flat::FlatTape, tape_rle::RleTape},
};

/// Cells printed on either side of the head by the Display impls.
pub const PRINT_TAPE_CTX: PosType = 5;

/// The common contract of the tape backends: a two-way-infinite sequence of
/// symbols with one head. Every cell never written holds symbol 0; moves are
/// exactly one cell per step. While the trait is not used for dynamic
/// dispatch (see [TapeBackend]), it keeps the backends interchangeable.
pub trait Tape: Display {
    /// Returns the symbol at the head.
    fn read_symbol(&self) -> CellType;

    /// Writes the symbol at the head.
    fn write_symbol(&mut self, symbol: CellType);

    /// Moves the head by delta (-1 or +1).
    /// # Returns
    /// False if a fixed tape capacity was exhausted. The caller must treat
    /// this as fatal for the run.
    #[must_use]
    fn move_head(&mut self, delta: MoveType) -> bool;

    /// Relative head position, 0 = starting cell.
    fn rel_pos(&self) -> PosType;

    /// Symbol at an arbitrary relative position; 0 for any cell outside the
    /// materialized region. Used by the tape comparison, not by the hot loop.
    fn read_at(&self, rel_pos: PosType) -> CellType;

    /// Number of non-zero cells on the whole tape (full scan).
    fn count_nonzero(&self) -> StepSmall;

    /// The width of one symbol in bits.
    fn sym_bits(&self) -> usize;

    /// Resets the tape to all blank with the head back at the start.
    fn clear(&mut self);
}

/// Which backend to build for a run slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeKind {
    Bit,
    Flat,
    Rle,
}

/// The three backends behind one type-tag, so a run can hold any mix of them
/// in its slots without generics leaking into the driver.
#[derive(Debug, Clone)]
pub enum TapeBackend {
    Bit(BitTape),
    Flat(FlatTape),
    Rle(RleTape),
}

impl TapeBackend {
    /// One constructor per backend, sized from the config.
    pub fn new(kind: TapeKind, sym_bits: usize, config: &Config) -> Self {
        match kind {
            TapeKind::Bit => {
                let cells = config.tape_size_bit_cells();
                TapeBackend::Bit(BitTape::new(cells, (cells / 2) as PosType, sym_bits))
            }
            TapeKind::Flat => {
                let cells = config.tape_size_init_cells();
                TapeBackend::Flat(FlatTape::new(cells, (cells / 2) as PosType, sym_bits))
            }
            TapeKind::Rle => TapeBackend::Rle(RleTape::new(sym_bits)),
        }
    }

    pub fn kind(&self) -> TapeKind {
        match self {
            TapeBackend::Bit(_) => TapeKind::Bit,
            TapeBackend::Flat(_) => TapeKind::Flat,
            TapeBackend::Rle(_) => TapeKind::Rle,
        }
    }

    pub fn as_flat(&self) -> Option<&FlatTape> {
        match self {
            TapeBackend::Flat(tape) => Some(tape),
            _ => None,
        }
    }

    pub fn as_flat_mut(&mut self) -> Option<&mut FlatTape> {
        match self {
            TapeBackend::Flat(tape) => Some(tape),
            _ => None,
        }
    }

    pub fn as_rle(&self) -> Option<&RleTape> {
        match self {
            TapeBackend::Rle(tape) => Some(tape),
            _ => None,
        }
    }
}

impl Tape for TapeBackend {
    fn read_symbol(&self) -> CellType {
        match self {
            TapeBackend::Bit(tape) => tape.read_symbol(),
            TapeBackend::Flat(tape) => tape.read_symbol(),
            TapeBackend::Rle(tape) => tape.read_symbol(),
        }
    }

    fn write_symbol(&mut self, symbol: CellType) {
        match self {
            TapeBackend::Bit(tape) => tape.write_symbol(symbol),
            TapeBackend::Flat(tape) => tape.write_symbol(symbol),
            TapeBackend::Rle(tape) => tape.write_symbol(symbol),
        }
    }

    fn move_head(&mut self, delta: MoveType) -> bool {
        match self {
            TapeBackend::Bit(tape) => tape.move_head(delta),
            TapeBackend::Flat(tape) => tape.move_head(delta),
            TapeBackend::Rle(tape) => tape.move_head(delta),
        }
    }

    fn rel_pos(&self) -> PosType {
        match self {
            TapeBackend::Bit(tape) => tape.rel_pos(),
            TapeBackend::Flat(tape) => tape.rel_pos(),
            TapeBackend::Rle(tape) => tape.rel_pos(),
        }
    }

    fn read_at(&self, rel_pos: PosType) -> CellType {
        match self {
            TapeBackend::Bit(tape) => tape.read_at(rel_pos),
            TapeBackend::Flat(tape) => tape.read_at(rel_pos),
            TapeBackend::Rle(tape) => tape.read_at(rel_pos),
        }
    }

    fn count_nonzero(&self) -> StepSmall {
        match self {
            TapeBackend::Bit(tape) => tape.count_nonzero(),
            TapeBackend::Flat(tape) => tape.count_nonzero(),
            TapeBackend::Rle(tape) => tape.count_nonzero(),
        }
    }

    fn sym_bits(&self) -> usize {
        match self {
            TapeBackend::Bit(tape) => tape.sym_bits(),
            TapeBackend::Flat(tape) => tape.sym_bits(),
            TapeBackend::Rle(tape) => tape.sym_bits(),
        }
    }

    fn clear(&mut self) {
        match self {
            TapeBackend::Bit(tape) => tape.clear(),
            TapeBackend::Flat(tape) => tape.clear(),
            TapeBackend::Rle(tape) => tape.clear(),
        }
    }
}

impl Display for TapeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TapeBackend::Bit(tape) => tape.fmt(f),
            TapeBackend::Flat(tape) => tape.fmt(f),
            TapeBackend::Rle(tape) => tape.fmt(f),
        }
    }
}

/// Head-centered excerpt shared by the array-backed Display impls.
pub(crate) fn fmt_excerpt(
    f: &mut std::fmt::Formatter<'_>,
    tape: &impl Tape,
) -> std::fmt::Result {
    let head = tape.rel_pos();
    for pos in head - PRINT_TAPE_CTX..=head + PRINT_TAPE_CTX {
        if pos == head {
            write!(f, "[{}]", tape.read_at(pos))?;
        } else {
            write!(f, " {} ", tape.read_at(pos))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::tape_cmp::{cmp_backends, TapeCmp};
    use proptest::prelude::*;

    #[test]
    fn one_constructor_per_backend() {
        let config = Config::new_default();
        for kind in [TapeKind::Bit, TapeKind::Flat, TapeKind::Rle] {
            let tape = TapeBackend::new(kind, 2, &config);
            assert_eq!(kind, tape.kind());
            assert_eq!(2, tape.sym_bits());
            assert_eq!(0, tape.rel_pos());
            assert_eq!(0, tape.read_symbol());
        }
    }

    proptest! {
        /// All three backends track the same model map under arbitrary
        /// write/move traces, and pairwise comparison stays Equal.
        #[test]
        fn backends_match_the_model(
            ops in proptest::collection::vec((0u16..4, proptest::bool::ANY), 1..300),
        ) {
            let config = Config::builder().tape_size_bit_cells(2048).build();
            let mut tapes = vec![
                TapeBackend::new(TapeKind::Bit, 2, &config),
                TapeBackend::new(TapeKind::Flat, 2, &config),
                TapeBackend::new(TapeKind::Rle, 2, &config),
            ];
            let mut model = std::collections::HashMap::new();
            let mut pos: PosType = 0;
            for (symbol, move_right) in ops {
                model.insert(pos, symbol);
                let delta: MoveType = if move_right { 1 } else { -1 };
                pos += delta as PosType;
                for tape in tapes.iter_mut() {
                    tape.write_symbol(symbol);
                    prop_assert!(tape.move_head(delta));
                    let expected = model.get(&pos).copied().unwrap_or(0);
                    prop_assert_eq!(expected, tape.read_symbol());
                    prop_assert_eq!(pos, tape.rel_pos());
                }
            }
            let nonzero = model.values().filter(|&&s| s != 0).count() as StepSmall;
            for tape in &tapes {
                for (p, symbol) in &model {
                    prop_assert_eq!(*symbol, tape.read_at(*p));
                }
                prop_assert_eq!(nonzero, tape.count_nonzero());
            }
            for i in 0..tapes.len() {
                for j in i + 1..tapes.len() {
                    prop_assert_eq!(
                        TapeCmp::Equal,
                        cmp_backends(&tapes[i], &tapes[j], 400)
                    );
                }
            }
        }
    }
}
