//! Output formatters for duplicate scan results.
//!
//! - [`text`]: one `hash: <digest> => <path>` line per duplicate file
//! - [`json`]: machine-readable groups, summary and skipped files
//!
//! Both formatters emit groups in catalog order (ascending digest) and
//! members in the order they were cataloged.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::DuplicateFinder;
//! use dupescan::output::TextOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! TextOutput::new(&groups).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::duplicates::{HashGroup, ScanSummary};
use crate::error::ExitCode;

pub use json::{JsonOutput, OutputError};
pub use text::TextOutput;

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `hash: <digest> => <path>` lines
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    /// Write a complete report in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_report<W: Write>(
        self,
        writer: &mut W,
        groups: &[HashGroup],
        summary: &ScanSummary,
        exit_code: ExitCode,
    ) -> Result<(), OutputError> {
        match self {
            OutputFormat::Text => TextOutput::new(groups).write_to(writer)?,
            OutputFormat::Json => JsonOutput::new(groups, summary, exit_code).write_to(writer, true)?,
        }
        Ok(())
    }
}
