//! Header bookkeeping for registry files.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::{DELIMITER, RESERVED_FIELDS};
use crate::error::{Error, Result};

/// Reads and writes a registry's header line and detects field-set drift.
pub struct SchemaStore {
    file: PathBuf,
}

impl SchemaStore {
    pub(crate) fn new(file: PathBuf) -> Self {
        Self { file }
    }

    /// Path of the underlying registry file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether the registry file exists yet.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.file.is_file()
    }

    /// The header implied by a set of parameter names: the reserved fields,
    /// then the names in sorted order.
    #[must_use]
    pub fn header_for<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut tail: Vec<String> = names.map(str::to_string).collect();
        tail.sort_unstable();
        let mut header: Vec<String> = RESERVED_FIELDS.iter().map(|f| (*f).to_string()).collect();
        header.extend(tail);
        header
    }

    /// Read the header line from the registry file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist and
    /// [`Error::CorruptState`] if it is empty.
    pub fn read_header(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Err(Error::NotFound(format!(
                "registry file '{}'",
                self.file.display()
            )));
        }
        let content = std::fs::read_to_string(&self.file)?;
        let first = content
            .lines()
            .next()
            .ok_or_else(|| Error::CorruptState("registry file is empty".to_string()))?;
        Ok(first.split(DELIMITER).map(str::to_string).collect())
    }

    /// Write `header` as the first (and only) line of a fresh registry file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub fn write_header(&self, header: &[String]) -> Result<()> {
        let mut file = std::fs::File::create(&self.file)?;
        writeln!(file, "{}", header.join(&DELIMITER.to_string()))?;
        file.flush()?;
        Ok(())
    }

    /// Verify that the on-disk header equals `observed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] naming both field lists when the
    /// registry header has drifted from the caller's field set.
    pub fn verify(&self, observed: &[String]) -> Result<()> {
        let expected = self.read_header()?;
        if expected != observed {
            return Err(Error::SchemaMismatch {
                expected,
                observed: observed.to_vec(),
            });
        }
        Ok(())
    }
}
