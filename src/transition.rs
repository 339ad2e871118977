//! The transition table: parse from and print to the Standard TM Text Format
//! <https://www.sligocki.com/2022/10/09/standard-tm-format.html>, packed
//! storage, and the instruction lookup used by the stepping driver.
//!
//! Storage is three parallel arrays addressed row-major by
//! `state * n_symbols + symbol`: written symbol, next state, and a bit-packed
//! direction table. Direction is a single bit, so one u64 word indexes 64
//! cells.

use std::fmt::Display;

use crate::{
    config::{CellType, DirType, MoveType, StateType},
    error::{printable, ParseError},
    tape::packed_buffer::ceil_log2,
};

pub const DIR_LEFT: DirType = 0;
pub const DIR_RIGHT: DirType = 1;

/// Halt sentinel; any state >= n_states halts, this is the canonical value.
pub const STATE_HALT: StateType = StateType::MAX;
/// Marks an undefined (`---`) cell so printing can round-trip. The driver
/// writes symbol 0 when it executes such a cell.
pub const SYMBOL_UNDEFINED: CellType = CellType::MAX;

/// The text format encodes states as single letters A-Z.
pub const MAX_STATES_TEXT: usize = 26;

const DIR_TAB_BITS_PER_FIELD: usize = u64::BITS as usize;

/// One table cell: the symbol to write, the head direction and the next
/// state. Produced by [TransitionTable::lookup], consumed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub symbol_write: CellType,
    pub direction: DirType,
    pub state_next: StateType,
}

impl Instruction {
    /// Head movement for this instruction; LEFT=0 maps to -1, RIGHT=1 to +1.
    #[inline]
    pub fn delta(&self) -> MoveType {
        if self.direction == DIR_LEFT {
            -1
        } else {
            1
        }
    }

    /// True for a `---` cell (halt on entry, nothing specified).
    pub fn is_undefined(&self) -> bool {
        self.symbol_write == SYMBOL_UNDEFINED
    }

    /// The symbol this instruction puts on the tape; an undefined cell
    /// writes blank.
    #[inline]
    pub fn symbol_to_write(&self) -> CellType {
        if self.is_undefined() {
            0
        } else {
            self.symbol_write
        }
    }
}

/// Displays the instruction as one Standard TM Text Format cell.
impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_undefined() {
            return write!(f, "---");
        }
        let symbol = match self.symbol_write {
            0..=9 => (self.symbol_write as u8 + b'0') as char,
            _ => '-',
        };
        let direction = if self.direction == DIR_LEFT { 'L' } else { 'R' };
        let state = if self.state_next == STATE_HALT {
            'Z'
        } else if (self.state_next as usize) < MAX_STATES_TEXT {
            (self.state_next as u8 + b'A') as char
        } else {
            '?'
        };
        write!(f, "{symbol}{direction}{state}")
    }
}

/// The packed transition table of one machine, a total function over
/// `[0, n_states) x [0, n_symbols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    n_states: usize,
    n_symbols: usize,
    symbol_tab: Vec<CellType>,
    state_tab: Vec<StateType>,
    /// One direction bit per cell, LEFT=0 / RIGHT=1.
    dir_tab: Vec<u64>,
}

impl TransitionTable {
    /// An empty table with every cell undefined (halt on entry). The macro
    /// encoder fills it with [Self::store].
    pub fn new(n_symbols: usize, n_states: usize) -> Self {
        assert!(n_symbols > 0 && n_states > 0);
        let n_cells = n_states * n_symbols;
        Self {
            n_states,
            n_symbols,
            symbol_tab: vec![SYMBOL_UNDEFINED; n_cells],
            state_tab: vec![STATE_HALT; n_cells],
            dir_tab: vec![0; n_cells.div_ceil(DIR_TAB_BITS_PER_FIELD)],
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_symbols(&self) -> usize {
        self.n_symbols
    }

    /// Symbol width of the tapes this machine runs on.
    pub fn sym_bits(&self) -> usize {
        ceil_log2(self.n_symbols).max(1)
    }

    /// The machine is halted in any state at or beyond n_states.
    #[inline]
    pub fn is_halt_state(&self, state: StateType) -> bool {
        state as usize >= self.n_states
    }

    /// Stores an instruction for (state, symbol).
    pub fn store(&mut self, state: StateType, symbol: CellType, instr: Instruction) {
        assert!((state as usize) < self.n_states);
        assert!((symbol as usize) < self.n_symbols);
        assert!(
            instr.symbol_write == SYMBOL_UNDEFINED
                || (instr.symbol_write as usize) < self.n_symbols
        );
        assert!(instr.direction == DIR_LEFT || instr.direction == DIR_RIGHT);

        let idx = state as usize * self.n_symbols + symbol as usize;
        self.symbol_tab[idx] = instr.symbol_write;
        self.state_tab[idx] = instr.state_next;

        let field_idx = idx / DIR_TAB_BITS_PER_FIELD;
        let bit_idx = idx % DIR_TAB_BITS_PER_FIELD;
        if instr.direction == DIR_LEFT {
            self.dir_tab[field_idx] &= !(1u64 << bit_idx);
        } else {
            self.dir_tab[field_idx] |= 1u64 << bit_idx;
        }
    }

    /// Retrieves the instruction for (state, symbol).
    #[inline]
    pub fn lookup(&self, state: StateType, symbol: CellType) -> Instruction {
        debug_assert!((state as usize) < self.n_states);
        debug_assert!((symbol as usize) < self.n_symbols);

        let idx = state as usize * self.n_symbols + symbol as usize;
        let field_idx = idx / DIR_TAB_BITS_PER_FIELD;
        let bit_idx = idx % DIR_TAB_BITS_PER_FIELD;
        Instruction {
            symbol_write: self.symbol_tab[idx],
            direction: ((self.dir_tab[field_idx] >> bit_idx) & 1) as DirType,
            state_next: self.state_tab[idx],
        }
    }

    /// Parses a table from the Standard TM Text Format,
    /// e.g. "1RB1LB_1LA1RZ". The number of symbols follows from the width of
    /// the first row, the number of states from the total length; any
    /// deviation from that grid is an error naming row, column and the
    /// offending character.
    pub fn from_standard_tm_text_format(text: &str) -> Result<Self, ParseError> {
        let bytes = text.as_bytes();
        // NUL for anything past the end, like reading a C string
        let at = |idx: usize| -> u8 { bytes.get(idx).copied().unwrap_or(0) };

        // Width of the first row gives the number of symbols
        let mut cols = 0;
        while cols < bytes.len() && bytes[cols] != b'_' {
            cols += 1;
        }
        if cols == 0 {
            return Err(ParseError::Empty);
        }
        if cols % 3 != 0 {
            return Err(ParseError::RowWidth { width: cols });
        }
        let n_symbols = cols / 3;

        // Each row has three characters per symbol plus one separator, the
        // last row has none; the grid checks below verify the shape.
        let n_states = (bytes.len() + 1) / (n_symbols * 3 + 1);
        if n_states == 0 {
            return Err(ParseError::Empty);
        }

        let mut table = Self::new(n_symbols, n_states);
        let max_symbol = (b'0' + n_symbols as u8 - 1) as char;

        for i_state in 0..n_states {
            for i_sym in 0..n_symbols {
                let txt_idx = i_state * (n_symbols * 3 + 1) + i_sym * 3;

                let sym_c = at(txt_idx);
                if !sym_c.is_ascii_digit() || (sym_c - b'0') as usize >= n_symbols {
                    // Undefined cells only if all three chars are '-'
                    if sym_c == b'-' && at(txt_idx + 1) == b'-' && at(txt_idx + 2) == b'-' {
                        table.store(
                            i_state as StateType,
                            i_sym as CellType,
                            Instruction {
                                symbol_write: SYMBOL_UNDEFINED,
                                direction: DIR_RIGHT, // dummy, will not be read
                                state_next: STATE_HALT,
                            },
                        );
                        continue;
                    }
                    return Err(ParseError::Symbol {
                        ch: printable(sym_c),
                        row: i_state,
                        col: i_sym,
                        max_symbol,
                    });
                }
                let symbol_write = (sym_c - b'0') as CellType;

                let dir_c = at(txt_idx + 1);
                let direction = match dir_c {
                    b'L' => DIR_LEFT,
                    b'R' => DIR_RIGHT,
                    _ => {
                        return Err(ParseError::Direction {
                            ch: printable(dir_c),
                            row: i_state,
                            col: i_sym,
                        })
                    }
                };

                let state_c = at(txt_idx + 2);
                if !state_c.is_ascii_uppercase() {
                    return Err(ParseError::State {
                        ch: printable(state_c),
                        row: i_state,
                        col: i_sym,
                    });
                }
                let mut state_next = (state_c - b'A') as StateType;
                if state_next as usize >= n_states {
                    state_next = STATE_HALT;
                    if state_c != b'Z' && state_c != b'H' {
                        tracing::warn!(
                            "unusual halting state {} at row {i_state} col {i_sym}, \
                             should be either A-{} or H or Z",
                            state_c as char,
                            (b'A' + n_states as u8 - 1) as char,
                        );
                    }
                }

                table.store(
                    i_state as StateType,
                    i_sym as CellType,
                    Instruction {
                        symbol_write,
                        direction,
                        state_next,
                    },
                );
            }

            // Row terminator: an underscore between rows, end of input after
            // the last row.
            let term = at(i_state * (n_symbols * 3 + 1) + n_symbols * 3);
            if i_state < n_states - 1 && term != b'_' {
                return Err(ParseError::RowTerminator {
                    ch: printable(term),
                    row: i_state,
                });
            }
            if i_state == n_states - 1 && term != 0 {
                return Err(ParseError::Trailing {
                    ch: printable(term),
                    row: i_state,
                });
            }
        }

        Ok(table)
    }

    /// Prints the table in the Standard TM Text Format. Only tables with up
    /// to 26 states have a letter per state.
    pub fn to_standard_tm_text_format(&self) -> String {
        assert!(self.n_states <= MAX_STATES_TEXT);
        let mut rows = Vec::with_capacity(self.n_states);
        for state in 0..self.n_states {
            let mut row = String::with_capacity(self.n_symbols * 3);
            for symbol in 0..self.n_symbols {
                row.push_str(
                    &self
                        .lookup(state as StateType, symbol as CellType)
                        .to_string(),
                );
            }
            rows.push(row);
        }
        rows.join("_")
    }
}

/// Displays the transitions in a multiline table with a symbol header and one
/// lettered row per state.
impl Display for TransitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for symbol in 0..self.n_symbols {
            write!(f, "   {symbol}")?;
        }
        for state in 0..self.n_states {
            let letter = if state < MAX_STATES_TEXT {
                (state as u8 + b'A') as char
            } else {
                '?'
            };
            write!(f, "\n{letter}")?;
            for symbol in 0..self.n_symbols {
                write!(f, " {}", self.lookup(state as StateType, symbol as CellType))?;
            }
        }
        Ok(())
    }
}
