//! Runtime mode.

use std::fmt;

use clap::ValueEnum;

/// Environment variable selecting the run mode.
pub const MODE_ENV: &str = "GORY_MODE";

/// Selects log sink and verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RunMode {
    #[default]
    Debug,
    Release,
    Test,
}

impl RunMode {
    pub fn is_release(&self) -> bool {
        matches!(self, RunMode::Release)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Debug => "debug",
            RunMode::Release => "release",
            RunMode::Test => "test",
        };
        f.write_str(name)
    }
}
