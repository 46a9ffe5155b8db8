//! Sample id allocation from the last physical registry row.

use std::path::Path;

use super::{DELIMITER, FIRST_SAMPLE_ID, RESERVED_FIELDS};
use crate::error::{Error, Result};

/// Computes the next sample identifier from the last row of a registry.
///
/// The id is always derived from whatever is physically last in the file;
/// no separate counter is authoritative. Gaps left by externally removed
/// rows are preserved and never reused.
#[derive(Default)]
pub struct SampleAllocator {
    _private: (),
}

impl SampleAllocator {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    /// The id for the next sample of `registry_file`.
    ///
    /// Returns [`FIRST_SAMPLE_ID`] when the last line is the header itself
    /// (empty registry), otherwise the last row's id plus one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist and
    /// [`Error::CorruptState`] if the last row's first field is not an
    /// integer.
    pub fn next_id(&self, registry_file: &Path) -> Result<u64> {
        if !registry_file.is_file() {
            return Err(Error::NotFound(format!(
                "registry file '{}'",
                registry_file.display()
            )));
        }
        let content = std::fs::read_to_string(registry_file)?;
        let last = content
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| Error::CorruptState("registry file is empty".to_string()))?;

        let first_field = last.split(DELIMITER).next().unwrap_or_default();
        if first_field == RESERVED_FIELDS[0] {
            return Ok(FIRST_SAMPLE_ID);
        }
        let previous: u64 = first_field.parse().map_err(|_| {
            Error::CorruptState(format!("last row's sample id '{first_field}' is not an integer"))
        })?;
        Ok(previous + 1)
    }
}
