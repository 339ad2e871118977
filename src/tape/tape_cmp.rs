//! Equality over infinite tapes held in different representations. The
//! RLE-vs-flat pair compares the full materialized extent of both tapes;
//! same-representation pairs compare a bounded window around the head, which
//! keeps the check O(window) at the cost of missing differences outside it.

use crate::{
    config::PosType,
    tape::{tape_flat::FlatTape, tape_rle::RleTape, Tape, TapeBackend},
};

/// Result of a tape comparison. On a symbol difference the reported position
/// is the first one found on the side examined first (left), i.e. the
/// position closest to the head on that side, not the globally minimum one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeCmp {
    Equal,
    /// The head positions disagree; no cell was compared.
    DiffHead,
    /// First observed differing relative position.
    DiffAt(PosType),
}

/// Compares an RLE tape against a flat tape over the full materialized extent
/// of both: the RLE runs are walked outward from the head against the flat
/// cells, then the flat remainder outside the RLE extent is checked against
/// the implicit blank tape.
pub fn cmp_rle_flat(rle: &RleTape, flat: &FlatTape) -> TapeCmp {
    if rle.rel_pos() != flat.rel_pos() {
        return TapeCmp::DiffHead;
    }
    let head = rle.rel_pos();
    let flat_min = -flat.init_pos();
    let flat_max = flat.len() as PosType - flat.init_pos() - 1;

    // Head's run at and left of the head, then the runs further left
    let mut pos = head;
    let head_run_sym = rle.read_symbol();
    for _ in 0..=rle.rle_pos() {
        if flat.read_at(pos) != head_run_sym {
            return TapeCmp::DiffAt(pos);
        }
        pos -= 1;
    }
    for (symbol, len) in rle.runs_leftward() {
        for _ in 0..len {
            if flat.read_at(pos) != symbol {
                return TapeCmp::DiffAt(pos);
            }
            pos -= 1;
        }
    }
    // Flat cells left of the RLE extent must all be blank
    while pos >= flat_min {
        if flat.read_at(pos) != 0 {
            return TapeCmp::DiffAt(pos);
        }
        pos -= 1;
    }

    // Head's run right of the head, then the runs further right
    let mut pos = head + 1;
    for _ in rle.rle_pos() + 1..rle.curr_len() {
        if flat.read_at(pos) != head_run_sym {
            return TapeCmp::DiffAt(pos);
        }
        pos += 1;
    }
    for (symbol, len) in rle.runs_rightward() {
        for _ in 0..len {
            if flat.read_at(pos) != symbol {
                return TapeCmp::DiffAt(pos);
            }
            pos += 1;
        }
    }
    while pos <= flat_max {
        if flat.read_at(pos) != 0 {
            return TapeCmp::DiffAt(pos);
        }
        pos += 1;
    }

    TapeCmp::Equal
}

/// Compares any two tapes over a window of `window` cells on either side of
/// the head, left side first. Cells outside the materialized regions read 0.
pub fn cmp_windowed(a: &impl Tape, b: &impl Tape, window: PosType) -> TapeCmp {
    if a.rel_pos() != b.rel_pos() {
        return TapeCmp::DiffHead;
    }
    let head = a.rel_pos();
    for delta in 0..=window {
        let pos = head - delta;
        if a.read_at(pos) != b.read_at(pos) {
            return TapeCmp::DiffAt(pos);
        }
    }
    for delta in 1..=window {
        let pos = head + delta;
        if a.read_at(pos) != b.read_at(pos) {
            return TapeCmp::DiffAt(pos);
        }
    }
    TapeCmp::Equal
}

/// Picks the strongest comparison available for a backend pair: the full
/// RLE-vs-flat walk where applicable, the bounded window otherwise.
pub fn cmp_backends(a: &TapeBackend, b: &TapeBackend, window: PosType) -> TapeCmp {
    match (a, b) {
        (TapeBackend::Rle(rle), TapeBackend::Flat(flat))
        | (TapeBackend::Flat(flat), TapeBackend::Rle(rle)) => cmp_rle_flat(rle, flat),
        _ => cmp_windowed(a, b, window),
    }
}
