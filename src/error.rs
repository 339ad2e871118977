//! Error types of the simulator. Parse errors carry the grid coordinates and
//! the offending character of the Standard TM Text Format input; macro encode
//! errors name the `(macro_state, macro_symbol)` cell that failed.

use thiserror::Error;

use crate::config::{CellType, StateType, StepSmall};

/// Renders a byte for an error message; NUL becomes '?' so diagnostics stay printable.
pub(crate) fn printable(byte: u8) -> char {
    if byte == 0 || !byte.is_ascii_graphic() {
        '?'
    } else {
        byte as char
    }
}

/// A deviation from the Standard TM Text Format grid. Row and col address the
/// transition cell (not the byte offset).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid width {width} of row, should be divisible by 3")]
    RowWidth { width: usize },

    #[error("empty transition table text")]
    Empty,

    #[error("invalid symbol '{ch}' at row {row} col {col}, should be 0-{max_symbol}")]
    Symbol {
        ch: char,
        row: usize,
        col: usize,
        max_symbol: char,
    },

    #[error("invalid direction '{ch}' at row {row} col {col}, should be L or R")]
    Direction { ch: char, row: usize, col: usize },

    #[error("invalid state '{ch}' at row {row} col {col}, should be A-Z")]
    State { ch: char, row: usize, col: usize },

    #[error("invalid row terminator '{ch}' at row {row}, should be underscore")]
    RowTerminator { ch: char, row: usize },

    #[error("trailing character '{ch}' at row {row}, expected end of input")]
    Trailing { ch: char, row: usize },
}

/// Failure to determine one macro instruction. Both variants are well-defined
/// "undecided" outcomes: the inner machine neither halted nor left its macro
/// cell within the configured budget, or it provably never will.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacroEncodeError {
    #[error("macro machines require a 2-symbol base machine, got {n_symbols}")]
    UnsupportedSymbolCount { n_symbols: usize },

    #[error("macro scale {scale} not in 1..={max_scale}")]
    UnsupportedScale { scale: usize, max_scale: usize },

    #[error(
        "inner simulation for macro state {macro_state} symbol {macro_symbol} \
         exceeded {step_limit} steps"
    )]
    InnerStepLimit {
        macro_state: StateType,
        macro_symbol: CellType,
        step_limit: StepSmall,
    },

    #[error(
        "inner simulation for macro state {macro_state} symbol {macro_symbol} \
         cycles inside its macro cell"
    )]
    InnerCycle {
        macro_state: StateType,
        macro_symbol: CellType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_byte_renders_as_question_mark() {
        assert_eq!('?', printable(0));
        assert_eq!('?', printable(b'\n'));
        assert_eq!('R', printable(b'R'));
    }

    #[test]
    fn parse_error_names_the_cell() {
        let e = ParseError::Direction {
            ch: 'x',
            row: 2,
            col: 1,
        };
        assert_eq!(
            "invalid direction 'x' at row 2 col 1, should be L or R",
            e.to_string()
        );
    }
}
