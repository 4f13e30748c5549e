//! The UCI option table (§6): engine settings the GUI can set with
//! `setoption`, plus a handful of collaborator settings (opening book, CSV
//! openings, tablebase) that are only ever read by the collaborators
//! themselves.
//!
//! Mirrors `original_source/engines/dragonbot.py`'s `_configure`: every
//! setter validates and clamps its input, silently keeping the previous
//! value on anything malformed rather than erroring out a `setoption`
//! command.
use uci::options::{OptionType, UciOption};

pub const DEFAULT_DEPTH: usize = 20;
pub const DEFAULT_TB_PROBE_LIMIT: i32 = 7;
pub const DEFAULT_BOOK_MIN_WEIGHT: i32 = 1;
pub const DEFAULT_CSV_OPENINGS_PATH: &str = "openings.csv";

/// The options this engine advertises in response to `uci`, in the order
/// they should be printed.
pub const UCI_OPTIONS: [UciOption; 9] = [
    UciOption {
        name: "Hash",
        option_type: OptionType::Spin {
            min: 4,
            max: 1024,
            default: engine::search::params::DEFAULT_TT_SIZE as i32,
        },
    },
    UciOption {
        name: "Depth",
        option_type: OptionType::Spin { min: 1, max: 128, default: DEFAULT_DEPTH as i32 },
    },
    UciOption {
        name: "Nodes",
        option_type: OptionType::Spin { min: 0, max: i32::MAX, default: 0 },
    },
    UciOption {
        name: "SyzygyPath",
        option_type: OptionType::String { default: String::new() },
    },
    UciOption {
        name: "TablebaseProbeLimit",
        option_type: OptionType::Spin { min: 3, max: 7, default: DEFAULT_TB_PROBE_LIMIT },
    },
    UciOption {
        name: "UseBook",
        option_type: OptionType::Check { default: false },
    },
    UciOption {
        name: "Book",
        option_type: OptionType::String { default: String::new() },
    },
    UciOption {
        name: "BookMinWeight",
        option_type: OptionType::Spin { min: 0, max: 65535, default: DEFAULT_BOOK_MIN_WEIGHT },
    },
    UciOption {
        name: "UseCSVOpenings",
        option_type: OptionType::Check { default: true },
    },
];

/// Live engine configuration, updated in place by `setoption` and read by
/// the UCI loop and the collaborators before every `search`.
#[derive(Debug, Clone)]
pub struct Config {
    pub hash_mb: usize,
    pub depth: Option<usize>,
    pub nodes: Option<u32>,
    pub syzygy_path: Option<String>,
    pub tb_probe_limit: i32,
    pub use_book: bool,
    pub book_path: Option<String>,
    pub book_min_weight: i32,
    pub use_csv_openings: bool,
    pub csv_openings_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_mb: engine::search::params::DEFAULT_TT_SIZE,
            depth: None,
            nodes: None,
            syzygy_path: None,
            tb_probe_limit: DEFAULT_TB_PROBE_LIMIT,
            use_book: false,
            book_path: None,
            book_min_weight: DEFAULT_BOOK_MIN_WEIGHT,
            use_csv_openings: true,
            csv_openings_path: DEFAULT_CSV_OPENINGS_PATH.to_string(),
        }
    }
}

impl Config {
    /// Apply one `setoption name <name> value <value>` command. Unknown
    /// option names and values that fail to parse are reported but don't
    /// change anything.
    pub fn set(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        match name {
            "Hash" => {
                if let Ok(mb) = value.parse::<usize>() {
                    self.hash_mb = mb.clamp(4, 1024);
                }
            }

            "Depth" => {
                if let Ok(depth) = value.parse::<usize>() {
                    if depth > 0 {
                        self.depth = Some(depth);
                    }
                }
            }

            "Nodes" => {
                if let Ok(nodes) = value.parse::<u32>() {
                    if nodes > 0 {
                        self.nodes = Some(nodes);
                    }
                }
            }

            "SyzygyPath" => {
                if !value.is_empty() {
                    self.syzygy_path = Some(value.to_string());
                }
            }

            "TablebaseProbeLimit" => {
                if let Ok(limit) = value.parse::<i32>() {
                    self.tb_probe_limit = if (3..=7).contains(&limit) { limit } else { 7 };
                }
            }

            "UseBook" => {
                if let Ok(flag) = value.parse::<bool>() {
                    self.use_book = flag;
                }
            }

            "Book" => {
                if !value.is_empty() {
                    self.book_path = Some(value.to_string());
                }
            }

            "BookMinWeight" => {
                if let Ok(weight) = value.parse::<i32>() {
                    if (0..=65535).contains(&weight) {
                        self.book_min_weight = weight;
                    }
                }
            }

            "UseCSVOpenings" => {
                if let Ok(flag) = value.parse::<bool>() {
                    self.use_csv_openings = flag;
                }
            }

            "CSVOpeningsPath" => {
                if !value.is_empty() {
                    self.csv_openings_path = value.to_string();
                }
            }

            _ => eprintln!("Unrecognised option: {name}"),
        }

        Ok(())
    }
}
