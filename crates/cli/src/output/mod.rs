//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also handles progress bars, tables and colored output.

mod formatter;
mod progress;
mod table;

pub use formatter::Formatter;
pub use progress::ProgressBar;
pub use table::{entity_table, file_entry_table, report_table};

use cx_core::Defaults;

/// Output configuration derived from CLI flags and the `[defaults]` table
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress bar
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Fill in what the flags left unset from the configured defaults
    ///
    /// Flags can only switch JSON on and colors or progress off, so a
    /// configured default never overrides an explicit flag.
    pub fn with_defaults(mut self, defaults: &Defaults) -> Self {
        self.json |= defaults.output.eq_ignore_ascii_case("json");
        self.no_color |= defaults.color.eq_ignore_ascii_case("never");
        self.no_progress |= !defaults.progress;
        self
    }
}
