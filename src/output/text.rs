//! Plain text output.
//!
//! ```text
//! hash: 3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b => /photos/a.jpg
//! hash: 3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b => /backup/a.jpg
//! ```

use std::io::{self, Write};

use crate::duplicates::HashGroup;

/// Line-per-file text report.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    groups: &'a [HashGroup],
}

impl<'a> TextOutput<'a> {
    /// Create a text report over `groups`.
    #[must_use]
    pub fn new(groups: &'a [HashGroup]) -> Self {
        Self { groups }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.groups {
            let hex = group.hash_hex();
            for file in &group.files {
                writeln!(writer, "hash: {} => {}", hex, file.path.display())?;
            }
        }
        writer.flush()
    }
}
