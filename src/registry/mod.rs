//! Flat-file registry of experiment samples.
//!
//! A registry is a `;`-delimited text file (`registry.csv`) living in a
//! caller-supplied parent directory. The first line is the header: the
//! reserved fields `Sample` and `Time`, then the caller's parameter names in
//! sorted order. Every subsequent line is one sample, appended by
//! [`Registry::catalogue`] and never mutated in place.
//!
//! A companion `registry.html` mirrors the same rows for human inspection.
//! It is derived state: it is regenerated after every registry mutation and
//! is never read back.
//!
//! # Usage
//!
//! ```no_run
//! use orgmin::{ParamValue, ParameterSet, Registry};
//!
//! struct Config {
//!     omega: f64,
//! }
//!
//! impl ParameterSet for Config {
//!     fn fields(&self) -> Vec<(String, ParamValue)> {
//!         vec![("omega".into(), self.omega.into())]
//!     }
//! }
//!
//! let registry = Registry::open("experimental_results")?;
//! let sample_dir = registry.catalogue(&Config { omega: 1.5 })?;
//! // run the experiment, save results under `sample_dir`
//! # Ok::<(), orgmin::Error>(())
//! ```

mod allocator;
mod render;
mod schema;

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

pub use allocator::SampleAllocator;
pub use schema::SchemaStore;

use crate::error::{Error, Result};
use crate::params::{ParamValue, ParameterSet};

/// The field separator used in registry files. Not permitted inside
/// string-typed values.
pub const DELIMITER: char = ';';

/// File name of the registry inside its parent directory.
pub const REGISTRY_FILE: &str = "registry.csv";

/// File name of the derived HTML rendering.
pub const RENDER_FILE: &str = "registry.html";

/// Fields every registry row starts with, in order.
pub const RESERVED_FIELDS: [&str; 2] = ["Sample", "Time"];

/// The id assigned to the first sample of a fresh registry.
pub const FIRST_SAMPLE_ID: u64 = 10_000;

const TIME_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// One row of a registry, as (field, value) pairs in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryRow {
    fields: Vec<(String, String)>,
}

impl RegistryRow {
    fn new(header: &[String], values: &[&str]) -> Self {
        Self {
            fields: header
                .iter()
                .zip(values)
                .map(|(f, v)| (f.clone(), (*v).to_string()))
                .collect(),
        }
    }

    /// Look up a value by field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, v)| v.as_str())
    }

    /// The sample id recorded in this row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptState`] if the `Sample` field is missing or
    /// not an integer.
    pub fn sample_id(&self) -> Result<u64> {
        let text = self
            .get(RESERVED_FIELDS[0])
            .ok_or_else(|| Error::CorruptState("row has no Sample field".to_string()))?;
        text.parse()
            .map_err(|_| Error::CorruptState(format!("sample id '{text}' is not an integer")))
    }

    /// Iterate over (field, value) pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    /// The number of fields in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Orchestrates catalogue creation, consistency checks, and appends for one
/// registry directory.
///
/// Owns a [`SchemaStore`] for the header line and a [`SampleAllocator`] for
/// monotonic id assignment. A `Registry` assumes a single sequential thread
/// of control per registry file; concurrent catalogue calls from independent
/// processes must be serialized externally.
pub struct Registry {
    parent: PathBuf,
    schema: SchemaStore,
    allocator: SampleAllocator,
}

impl Registry {
    /// Open the registry rooted at `parent_dir`.
    ///
    /// The directory must pre-exist; the registry file itself is created
    /// lazily by the first [`catalogue`](Self::catalogue) call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `parent_dir` is not a directory.
    pub fn open(parent_dir: impl AsRef<Path>) -> Result<Self> {
        let parent = parent_dir.as_ref().to_path_buf();
        if !parent.is_dir() {
            return Err(Error::NotFound(format!(
                "registry directory '{}'",
                parent.display()
            )));
        }
        let file = parent.join(REGISTRY_FILE);
        Ok(Self {
            parent,
            schema: SchemaStore::new(file),
            allocator: SampleAllocator::new(),
        })
    }

    /// Path of the registry file.
    #[must_use]
    pub fn file(&self) -> &Path {
        self.schema.file()
    }

    /// Record one sample and return its dedicated result directory.
    ///
    /// Creates the registry files on first use, verifies that the existing
    /// header matches the caller's field set, allocates the next sample id,
    /// appends exactly one row, regenerates the HTML rendering (best
    /// effort), and creates the `<sample_id>` subdirectory.
    ///
    /// # Errors
    ///
    /// - [`Error::SchemaMismatch`] if the registry header does not match the
    ///   field set of `params`; nothing is written.
    /// - [`Error::InvalidValue`] if a string value contains the delimiter;
    ///   nothing is written.
    /// - [`Error::Io`] on file system failures.
    pub fn catalogue(&self, params: &impl ParameterSet) -> Result<PathBuf> {
        let mut fields = params.fields();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        // Reject unserializable names and values before touching any file.
        let mut values = Vec::with_capacity(fields.len());
        for (name, value) in &fields {
            check_field_name(name)?;
            values.push(value.format(name)?);
        }

        let header = SchemaStore::header_for(fields.iter().map(|(n, _)| n.as_str()));
        if !self.schema.exists() {
            tracing::info!(dir = %self.parent.display(), "creating registry files");
            self.schema.write_header(&header)?;
        }
        self.schema.verify(&header)?;

        let sample = self.allocator.next_id(self.file())?;
        let time = chrono::Local::now().format(TIME_FORMAT).to_string();

        let mut row = vec![sample.to_string(), time];
        row.extend(values);
        self.append_line(&row.join(&DELIMITER.to_string()))?;

        // The row is durable at this point; rendering is derived state and
        // must never fail the catalogue call.
        render::regenerate(self.file(), &self.parent.join(RENDER_FILE));

        let sample_dir = self.parent.join(sample.to_string());
        std::fs::create_dir(&sample_dir)?;
        tracing::debug!(sample, dir = %sample_dir.display(), "catalogued sample");
        Ok(sample_dir)
    }

    fn append_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.file())?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    /// Load the row whose `Sample` field equals `sample_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the registry file does not exist or no
    /// row carries the given id, and [`Error::CorruptState`] if the matching
    /// row disagrees with the header's field count.
    pub fn load(parent_dir: impl AsRef<Path>, sample_id: u64) -> Result<RegistryRow> {
        let file = parent_dir.as_ref().join(REGISTRY_FILE);
        if !file.is_file() {
            return Err(Error::NotFound(format!(
                "registry file '{}'",
                file.display()
            )));
        }
        let content = std::fs::read_to_string(&file)?;
        let mut lines = content.lines();
        let header: Vec<String> = lines
            .next()
            .unwrap_or_default()
            .split(DELIMITER)
            .map(str::to_string)
            .collect();

        let wanted = sample_id.to_string();
        for line in lines {
            let values: Vec<&str> = line.split(DELIMITER).collect();
            if values.first() == Some(&wanted.as_str()) {
                if values.len() != header.len() {
                    return Err(Error::CorruptState(format!(
                        "row for sample {sample_id} has {} fields, header has {}",
                        values.len(),
                        header.len()
                    )));
                }
                return Ok(RegistryRow::new(&header, &values));
            }
        }
        Err(Error::NotFound(format!(
            "sample {sample_id} in '{}'",
            file.display()
        )))
    }

    /// Add a new field to every existing row of a registry.
    ///
    /// The new field is inserted in sorted position among the non-reserved
    /// fields and every existing row receives `default_value`. The new
    /// column is string-typed; type enforcement for future rows is the
    /// caller's responsibility. The file is rewritten atomically
    /// (write-temp-then-rename), so a crash mid-write never leaves a
    /// partially rewritten registry.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `registry_file` does not exist.
    /// - [`Error::DuplicateField`] if `field_name` is already present; the
    ///   file is left byte-for-byte untouched.
    /// - [`Error::CorruptState`] if an existing row disagrees with the
    ///   header's field count.
    pub fn expand(
        registry_file: impl AsRef<Path>,
        field_name: &str,
        default_value: &str,
    ) -> Result<()> {
        let path = registry_file.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "registry file '{}'",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let mut lines = content.lines();
        let header: Vec<&str> = lines
            .next()
            .ok_or_else(|| Error::CorruptState("registry file is empty".to_string()))?
            .split(DELIMITER)
            .collect();

        if header.contains(&field_name) {
            return Err(Error::DuplicateField {
                name: field_name.to_string(),
            });
        }
        check_field_name(field_name)?;
        let default = ParamValue::from(default_value).format(field_name)?;

        let reserved = RESERVED_FIELDS.len().min(header.len());
        let mut tail: Vec<&str> = header[reserved..].to_vec();
        tail.push(field_name);
        tail.sort_unstable();
        // Inserting one name into the sorted tail keeps all other columns in
        // their relative order, so rows only need the default spliced in.
        let insert_at = reserved
            + tail
                .iter()
                .position(|f| *f == field_name)
                .unwrap_or(tail.len() - 1);

        let mut out = String::with_capacity(content.len() + default.len() * 8);
        let new_header: Vec<&str> = header[..reserved]
            .iter()
            .chain(tail.iter())
            .copied()
            .collect();
        out.push_str(&new_header.join(&DELIMITER.to_string()));
        out.push('\n');

        for (row_index, line) in lines.enumerate() {
            let mut values: Vec<&str> = line.split(DELIMITER).collect();
            if values.len() != header.len() {
                return Err(Error::CorruptState(format!(
                    "row {row_index} has {} fields, header has {}",
                    values.len(),
                    header.len()
                )));
            }
            values.insert(insert_at, &default);
            out.push_str(&values.join(&DELIMITER.to_string()));
            out.push('\n');
        }

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        std::fs::write(&tmp_path, out)?;
        std::fs::rename(&tmp_path, path)?;
        tracing::info!(field = field_name, file = %path.display(), "expanded registry");

        render::regenerate(path, &parent.join(RENDER_FILE));
        Ok(())
    }
}

/// A field name containing the delimiter would corrupt the header line.
fn check_field_name(name: &str) -> Result<()> {
    if name.contains(DELIMITER) {
        return Err(Error::InvalidValue {
            name: name.to_string(),
            reason: format!("field name contains the delimiter '{DELIMITER}'"),
        });
    }
    Ok(())
}
