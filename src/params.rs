//! Parameter value types and registry field formatting.

use crate::error::{Error, Result};
use crate::registry::DELIMITER;

/// Number of decimals used when formatting float parameters.
pub const FLOAT_PRECISION: usize = 6;

/// Strings longer than this are truncated before being catalogued.
pub const MAX_STRING_LEN: usize = 64;

/// A single parameter value as catalogued in a registry row.
///
/// This enum stores the different scalar types uniformly. Formatting to
/// registry text is fixed per variant: floats use scientific notation with
/// [`FLOAT_PRECISION`] decimals and a signed two-digit exponent, strings are
/// truncated to [`MAX_STRING_LEN`] characters, ints and bools use their
/// `Display` form.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A floating-point parameter value.
    Float(f64),
    /// An integer parameter value.
    Int(i64),
    /// A boolean parameter value.
    Bool(bool),
    /// A string parameter value.
    Str(String),
}

impl ParamValue {
    /// Format this value as registry text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if a string value contains the
    /// registry delimiter, which cannot be represented in a row.
    pub fn format(&self, name: &str) -> Result<String> {
        match self {
            Self::Float(v) => Ok(format_scientific(*v)),
            Self::Int(v) => Ok(v.to_string()),
            Self::Bool(v) => Ok(v.to_string()),
            Self::Str(s) => {
                if s.contains(DELIMITER) {
                    return Err(Error::InvalidValue {
                        name: name.to_string(),
                        reason: format!("string contains the delimiter '{DELIMITER}'"),
                    });
                }
                Ok(s.chars().take(MAX_STRING_LEN).collect())
            }
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// A declared set of experiment parameters.
///
/// Implementors list their fields once and get cataloguing and schema
/// validation for free. Field order does not matter; the registry stores
/// non-reserved fields in sorted name order.
///
/// # Examples
///
/// ```
/// use orgmin::{ParamValue, ParameterSet};
///
/// struct Config {
///     omega: f64,
///     oscillator_size: i64,
/// }
///
/// impl ParameterSet for Config {
///     fn fields(&self) -> Vec<(String, ParamValue)> {
///         vec![
///             ("omega".into(), self.omega.into()),
///             ("oscillator_size".into(), self.oscillator_size.into()),
///         ]
///     }
/// }
/// ```
pub trait ParameterSet {
    /// The declared (name, value) pairs for this parameter set.
    fn fields(&self) -> Vec<(String, ParamValue)>;

    /// Catalogue this parameter set under `parent_dir`.
    ///
    /// Convenience for [`Registry::open`](crate::Registry::open) followed by
    /// [`Registry::catalogue`](crate::Registry::catalogue). Returns the path
    /// to the sample directory allocated for this run.
    ///
    /// # Errors
    ///
    /// See [`Registry::catalogue`](crate::Registry::catalogue).
    fn catalogue(&self, parent_dir: impl AsRef<std::path::Path>) -> Result<std::path::PathBuf>
    where
        Self: Sized,
    {
        crate::Registry::open(parent_dir)?.catalogue(self)
    }
}

/// Format a float in fixed-precision scientific notation with a signed
/// two-digit exponent, e.g. `1.500000e+00`.
pub(crate) fn format_scientific(v: f64) -> String {
    let raw = format!("{v:.prec$e}", prec = FLOAT_PRECISION);
    // Rust renders `1.500000e0`; re-pad the exponent to `e+00` form.
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        // NaN and infinities carry no exponent.
        None => raw,
    }
}
