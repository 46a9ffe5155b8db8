#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a registry header does not match the caller's field set.
    #[error("schema mismatch: registry has fields {expected:?}, caller supplied {observed:?}")]
    SchemaMismatch {
        /// The field list recorded in the registry header.
        expected: Vec<String>,
        /// The field list implied by the caller's parameters.
        observed: Vec<String>,
    },

    /// Returned when `expand` targets a field that already exists.
    #[error("field '{name}' already exists in the registry")]
    DuplicateField {
        /// The name of the duplicate field.
        name: String,
    },

    /// Returned when a registry file, directory, or sample id is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Returned when persisted state cannot be parsed back.
    #[error("corrupt state: {0}")]
    CorruptState(String),

    /// Returned when an appended point disagrees with the buffer dimension.
    #[error("dimension mismatch: expected {expected} elements but point has {got}")]
    DimensionMismatch {
        /// The buffer's fixed dimension.
        expected: usize,
        /// The length of the rejected point.
        got: usize,
    },

    /// Returned when a parameter value cannot be serialized to the registry.
    #[error("invalid value for '{name}': {reason}")]
    InvalidValue {
        /// The name of the offending field.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when an underlying file operation fails.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
