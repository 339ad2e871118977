//! This crate contains the Config struct which is used to configure a simulation run.

use std::{fmt::Display, sync::LazyLock, time::SystemTime};

use hashbrown::HashMap;
use num_format::ToFormattedString;

use crate::toml::ConfigToml;

// Tape
/// Initial size of the flat tape in cells if not changed in the builder.
pub const TAPE_SIZE_INIT_CELLS: usize = 1024;
/// Default capacity of the fixed bit tape in cells. BB5_MAX touches roughly
/// 12,300 cells, so this leaves headroom for every machine in the corpus.
pub const TAPE_SIZE_BIT_CELLS_DEFAULT: usize = 32_768;

/// Default step limit; chosen so BB5_MAX (47,176,870 steps) fits.
pub const STEP_LIMIT_DEFAULT: StepBig = 50_000_000;
/// Default micro-step budget for one macro-instruction inner simulation.
/// This is a tuning parameter; on a k+2 cell tape the honest inner runs of the
/// corpus machines finish within a few hundred steps.
pub const MACRO_INNER_STEP_LIMIT_DEFAULT: StepSmall = 10_000;
/// Default half-width of the window used when comparing two tapes of the
/// same representation.
pub const CMP_WINDOW_CELLS_DEFAULT: PosType = 1000;
/// Default interval for the lockstep cross-check (0 turns it off).
pub const CROSS_CHECK_INTERVAL_DEFAULT: StepSmall = 1024;

/// Read config.toml only once.
pub static CONFIG_TOML: LazyLock<ConfigToml> = LazyLock::new(ConfigToml::read_toml);

// --- Below are program defining definitions, where changes may have a serious impact. ---

/// Number type used for step counters and step budgets.
pub type StepBig = u64;
/// Number type used for counters which never exceed u32, e.g. non-zero cells
/// or check intervals (casting is free on 64-bit machines).
pub type StepSmall = u32;

/// Tape cell storage size. u16 allows macro symbols up to scale 16.
pub type CellType = u16;
/// Head movement per step, always -1 or +1.
pub type MoveType = i8;
/// Numeric state, 0 = A. Halting is any value >= n_states.
pub type StateType = u16;
/// Move direction, a single bit. The LEFT=0/RIGHT=1 encoding is load-bearing:
/// macro states pack the entry direction into their lowest bit.
pub type DirType = u8;
/// Relative head position, 0 = starting cell.
pub type PosType = i64;

/// Max width of one symbol in bits as limited by [CellType].
pub const MAX_SYM_BITS: usize = CellType::BITS as usize;

/// Lowest/highest addressable head positions; two cells on each end are
/// reserved for boundary arithmetic.
pub const POS_MIN: PosType = PosType::MIN + 2;
pub const POS_MAX: PosType = PosType::MAX - 2;

/// This sets the configuration for a simulation run. \
/// Use [Self::new_default] or the [Self::builder] to create a Config. \
/// Since the config is designed immutable, one can use [Self::builder_from_config]
/// to copy values of an existing config and make changes.
/// # Example
/// ```
/// use bb_simulator::config::{Config, STEP_LIMIT_DEFAULT};
///
/// let config = Config::new_default();
/// assert_eq!(STEP_LIMIT_DEFAULT, config.step_limit_run());
///
/// let config = Config::builder().step_limit_run(10_000).build();
/// assert_eq!(10_000, config.step_limit_run());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Run step budget. If this many steps are walked, the run exits undecided.
    step_limit_run: StepBig,
    /// Initial length of the flat tape in cells.
    tape_size_init_cells: usize,
    /// Fixed capacity of the bit tape in cells. Exceeding it aborts the run.
    tape_size_bit_cells: usize,
    /// Micro-step budget for one inner simulation of the macro encoder.
    macro_inner_step_limit: StepSmall,
    /// Half-width of the compare window for same-representation tape pairs.
    cmp_window_cells: PosType,
    /// Cross-check every this many steps when 2..3 tapes run in lockstep.
    /// 0 turns the periodic check off; the per-step read agreement stays.
    cross_check_interval: StepSmall,
    /// Additional config e.g. for tools using this library.
    config_key_value_pair: HashMap<String, String>,
    /// Creation time of this Config. Used for report lines.
    creation_time: SystemTime,
    /// When set to false UTC is used instead, but this may be confusing to the user.
    use_local_time: bool,
}

impl Config {
    /// Builder to initialize required values.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Builder to initialize required values taking over values of existing config.
    pub fn builder_from_config(config: &Config) -> ConfigBuilder {
        ConfigBuilder::new_config(config.clone())
    }

    /// Default values, covering every machine in the verification corpus.
    pub fn new_default() -> Config {
        Self {
            step_limit_run: STEP_LIMIT_DEFAULT,
            tape_size_init_cells: TAPE_SIZE_INIT_CELLS,
            tape_size_bit_cells: TAPE_SIZE_BIT_CELLS_DEFAULT,
            macro_inner_step_limit: MACRO_INNER_STEP_LIMIT_DEFAULT,
            cmp_window_cells: CMP_WINDOW_CELLS_DEFAULT,
            cross_check_interval: CROSS_CHECK_INTERVAL_DEFAULT,
            config_key_value_pair: HashMap::new(),
            creation_time: SystemTime::now(),
            use_local_time: true,
        }
    }

    pub fn config_key_value(&self) -> &HashMap<String, String> {
        &self.config_key_value_pair
    }

    pub fn config_toml(&self) -> &ConfigToml {
        &CONFIG_TOML
    }

    /// Returns the value for the given key (get() from HashMap).
    pub fn config_value(&self, key: &str) -> Option<&String> {
        self.config_key_value_pair.get(key)
    }

    pub fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    pub fn cmp_window_cells(&self) -> PosType {
        self.cmp_window_cells
    }

    pub fn cross_check_interval(&self) -> StepSmall {
        self.cross_check_interval
    }

    pub fn macro_inner_step_limit(&self) -> StepSmall {
        self.macro_inner_step_limit
    }

    pub fn step_limit_run(&self) -> StepBig {
        self.step_limit_run
    }

    pub fn tape_size_bit_cells(&self) -> usize {
        self.tape_size_bit_cells
    }

    pub fn tape_size_init_cells(&self) -> usize {
        self.tape_size_init_cells
    }

    pub fn use_local_time(&self) -> bool {
        self.use_local_time
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new_default()
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    step_limit_run: Option<StepBig>,
    tape_size_init_cells: Option<usize>,
    tape_size_bit_cells: Option<usize>,
    macro_inner_step_limit: Option<StepSmall>,
    cmp_window_cells: Option<PosType>,
    cross_check_interval: Option<StepSmall>,
    config_key_value_pair: Option<HashMap<String, String>>,
    use_local_time: Option<bool>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            config: Config::new_default(),
            ..Default::default() // All: None,
        }
    }

    fn new_config(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn cmp_window_cells(mut self, window: PosType) -> Self {
        self.cmp_window_cells = Some(window);
        self
    }

    pub fn config_key_value_pair(mut self, pairs: HashMap<String, String>) -> Self {
        self.config_key_value_pair = Some(pairs);
        self
    }

    pub fn cross_check_interval(mut self, interval: StepSmall) -> Self {
        self.cross_check_interval = Some(interval);
        self
    }

    pub fn macro_inner_step_limit(mut self, step_limit: StepSmall) -> Self {
        self.macro_inner_step_limit = Some(step_limit);
        self
    }

    pub fn step_limit_run(mut self, step_limit: StepBig) -> Self {
        self.step_limit_run = Some(step_limit);
        self
    }

    pub fn tape_size_bit_cells(mut self, cells: usize) -> Self {
        self.tape_size_bit_cells = Some(cells);
        self
    }

    pub fn tape_size_init_cells(mut self, cells: usize) -> Self {
        self.tape_size_init_cells = Some(cells);
        self
    }

    pub fn use_local_time(mut self, value_false_is_utc: bool) -> Self {
        self.use_local_time = Some(value_false_is_utc);
        self
    }

    pub fn build(self) -> Config {
        Config {
            step_limit_run: self.step_limit_run.unwrap_or(self.config.step_limit_run),
            tape_size_init_cells: self
                .tape_size_init_cells
                .unwrap_or(self.config.tape_size_init_cells),
            tape_size_bit_cells: self
                .tape_size_bit_cells
                .unwrap_or(self.config.tape_size_bit_cells),
            macro_inner_step_limit: self
                .macro_inner_step_limit
                .unwrap_or(self.config.macro_inner_step_limit),
            cmp_window_cells: self
                .cmp_window_cells
                .unwrap_or(self.config.cmp_window_cells),
            cross_check_interval: self
                .cross_check_interval
                .unwrap_or(self.config.cross_check_interval),
            config_key_value_pair: self
                .config_key_value_pair
                .unwrap_or(self.config.config_key_value_pair),
            creation_time: SystemTime::now(),
            use_local_time: self.use_local_time.unwrap_or(self.config.use_local_time),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let locale = user_locale();
        write!(
            f,
            "Step Limit Run: {}, Macro Inner Limit: {}, ",
            self.step_limit_run.to_formatted_string(&locale),
            self.macro_inner_step_limit.to_formatted_string(&locale),
        )?;
        write!(
            f,
            "Tape Init Cells: {}, Bit Tape Cells: {}, Cmp Window: {}",
            self.tape_size_init_cells.to_formatted_string(&locale),
            self.tape_size_bit_cells.to_formatted_string(&locale),
            self.cmp_window_cells.to_formatted_string(&locale),
        )
    }
}

pub fn user_locale() -> num_format::Locale {
    // TODO get user locale
    num_format::Locale::en
}
