//! Growable record of the best evaluations seen during a minimization run.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Pre-allocated capacity of a fresh buffer.
pub const INITIAL_CAPACITY: usize = 1024;

/// Growth past this many entries logs an informational event.
const LARGE_CAPACITY: usize = 1 << 20;

const EVALUATIONS_FILE: &str = "evaluations.json";
const F_MINS_FILE: &str = "f_mins.json";
const X_BESTS_FILE: &str = "x_bests.json";
const TIME_FILE: &str = "time.txt";
const SUCCESS_FILE: &str = "solution_found.txt";

/// Sentinel written to the time artifact when timing never completed.
const TIME_ABSENT: &str = "None";

/// Append-only buffer of (evaluation count, best value, best point) triples.
///
/// The three sequences always have identical logical length and share one
/// pre-allocated capacity that doubles on overflow, bounding amortized
/// append cost to O(1). Best points are stored as one contiguous row-major
/// region of fixed width [`dim`](Self::dim).
///
/// A buffer additionally carries an optional wall-clock timing pair and a
/// success flag, and is owned exclusively by one run.
///
/// # Examples
///
/// ```
/// use orgmin::TrajectoryBuffer;
///
/// let mut buffer = TrajectoryBuffer::with_dim(2);
/// buffer.start_timing();
/// buffer.append(1, 4.2, &[0.5, -0.5])?;
/// buffer.stop_timing();
/// buffer.solution_found = true;
///
/// assert_eq!(buffer.evaluations(), &[1]);
/// assert_eq!(buffer.x_bests(), vec![&[0.5, -0.5][..]]);
/// # Ok::<(), orgmin::Error>(())
/// ```
pub struct TrajectoryBuffer {
    dim: usize,
    len: usize,
    capacity: usize,
    evaluations: Vec<u64>,
    f_mins: Vec<f64>,
    x_bests: Vec<f64>,
    start_time: Option<Instant>,
    elapsed: Option<Duration>,
    /// Whether the run reached its target. Defaults to `false`; persisted
    /// as exactly `True` or `False`.
    pub solution_found: bool,
}

impl TrajectoryBuffer {
    /// Create an empty buffer for points of width `dim`, with
    /// [`INITIAL_CAPACITY`] pre-allocated entries.
    #[must_use]
    pub fn with_dim(dim: usize) -> Self {
        Self::with_dim_and_capacity(dim, INITIAL_CAPACITY)
    }

    fn with_dim_and_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            len: 0,
            capacity,
            evaluations: vec![0; capacity],
            f_mins: vec![0.0; capacity],
            x_bests: vec![0.0; capacity * dim],
            start_time: None,
            elapsed: None,
            solution_found: false,
        }
    }

    /// The fixed width of best points in this buffer.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The logical number of recorded triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no triples have been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The physical capacity currently allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The recorded evaluation counts, logical length only.
    #[must_use]
    pub fn evaluations(&self) -> &[u64] {
        &self.evaluations[..self.len]
    }

    /// The recorded best values, logical length only.
    #[must_use]
    pub fn f_mins(&self) -> &[f64] {
        &self.f_mins[..self.len]
    }

    /// The recorded best points as one slice per row.
    #[must_use]
    pub fn x_bests(&self) -> Vec<&[f64]> {
        (0..self.len)
            .map(|i| &self.x_bests[i * self.dim..(i + 1) * self.dim])
            .collect()
    }

    /// Record one (evaluation count, best value, best point) triple.
    ///
    /// Grows all three sequences to double capacity first when the buffer
    /// is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `x_best` does not have
    /// exactly [`dim`](Self::dim) elements; the buffer is left untouched.
    pub fn append(&mut self, evaluations: u64, f_min: f64, x_best: &[f64]) -> Result<()> {
        if x_best.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                got: x_best.len(),
            });
        }
        if self.len == self.capacity {
            self.grow();
        }
        self.evaluations[self.len] = evaluations;
        self.f_mins[self.len] = f_min;
        self.x_bests[self.len * self.dim..(self.len + 1) * self.dim].copy_from_slice(x_best);
        self.len += 1;
        Ok(())
    }

    fn grow(&mut self) {
        self.capacity = if self.capacity == 0 {
            1
        } else {
            self.capacity * 2
        };
        self.evaluations.resize(self.capacity, 0);
        self.f_mins.resize(self.capacity, 0.0);
        self.x_bests.resize(self.capacity * self.dim, 0.0);
        if self.capacity > LARGE_CAPACITY {
            tracing::info!(
                capacity = self.capacity,
                threshold = LARGE_CAPACITY,
                "trajectory buffer grew past the informational threshold"
            );
        }
    }

    /// Record the wall-clock start of the run.
    ///
    /// Calling this twice is a warn-level no-op; the original start is kept.
    pub fn start_timing(&mut self) {
        if self.start_time.is_some() {
            tracing::warn!("start_timing called twice; keeping the original start");
            return;
        }
        self.start_time = Some(Instant::now());
    }

    /// Record the wall-clock end of the run.
    ///
    /// Calling this before [`start_timing`](Self::start_timing), or twice,
    /// is a warn-level no-op.
    pub fn stop_timing(&mut self) {
        match (self.start_time, self.elapsed) {
            (None, _) => tracing::warn!("stop_timing called before start_timing; ignoring"),
            (Some(_), Some(_)) => {
                tracing::warn!("stop_timing called twice; keeping the first measurement");
            }
            (Some(start), None) => self.elapsed = Some(start.elapsed()),
        }
    }

    /// The stopped duration, or `None` if timing never completed.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Write the buffer's logical contents to `dir`, one artifact per
    /// sequence plus the elapsed time and success flag.
    ///
    /// An absent elapsed time is written as the literal `None`, which
    /// [`restore`](Self::restore) parses back to absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `dir` is not a directory and
    /// [`Error::Io`] on write failures.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("directory '{}'", dir.display())));
        }
        write_json(&dir.join(EVALUATIONS_FILE), &self.evaluations())?;
        write_json(&dir.join(F_MINS_FILE), &self.f_mins())?;
        write_json(&dir.join(X_BESTS_FILE), &self.x_bests())?;

        let time_text = match self.elapsed {
            Some(duration) => duration.as_secs_f64().to_string(),
            None => TIME_ABSENT.to_string(),
        };
        std::fs::write(dir.join(TIME_FILE), time_text)?;
        std::fs::write(
            dir.join(SUCCESS_FILE),
            if self.solution_found { "True" } else { "False" },
        )?;
        Ok(())
    }

    /// Reconstruct a buffer from the artifacts written by
    /// [`persist`](Self::persist).
    ///
    /// The dimension is inferred from the width of the stored best-point
    /// rows and the capacity is set exactly to the restored logical length,
    /// with no extra slack.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if an artifact file is missing.
    /// - [`Error::CorruptState`] if the sequences disagree in length, a
    ///   best-point row is ragged, the time artifact is neither `None` nor
    ///   a decimal number, or the success artifact is not exactly `True`
    ///   or `False`.
    pub fn restore(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let evaluations: Vec<u64> = read_json(&dir.join(EVALUATIONS_FILE))?;
        let f_mins: Vec<f64> = read_json(&dir.join(F_MINS_FILE))?;
        let rows: Vec<Vec<f64>> = read_json(&dir.join(X_BESTS_FILE))?;

        let len = evaluations.len();
        if f_mins.len() != len || rows.len() != len {
            return Err(Error::CorruptState(format!(
                "artifact lengths disagree: {len} evaluation counts, {} best values, {} best points",
                f_mins.len(),
                rows.len()
            )));
        }

        let dim = rows.first().map_or(0, Vec::len);
        let mut x_bests = Vec::with_capacity(len * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::CorruptState(format!(
                    "best-point row {i} has width {}, expected {dim}",
                    row.len()
                )));
            }
            x_bests.extend_from_slice(row);
        }

        Ok(Self {
            dim,
            len,
            capacity: len,
            evaluations,
            f_mins,
            x_bests,
            start_time: None,
            elapsed: read_elapsed(&dir.join(TIME_FILE))?,
            solution_found: read_success(&dir.join(SUCCESS_FILE))?,
        })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string(value).map_err(std::io::Error::other)?;
    std::fs::write(path, text)?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("artifact '{}'", path.display()))
        } else {
            Error::Io(err)
        }
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .map_err(|err| Error::CorruptState(format!("'{}': {err}", path.display())))
}

fn read_elapsed(path: &Path) -> Result<Option<Duration>> {
    let text = read_text(path)?;
    let text = text.trim();
    if text == TIME_ABSENT {
        return Ok(None);
    }
    let seconds: f64 = text.parse().map_err(|_| {
        Error::CorruptState(format!("elapsed time '{text}' is neither a number nor None"))
    })?;
    // try_from_secs_f64 rejects negative, non-finite, and overflowing values.
    let duration = Duration::try_from_secs_f64(seconds)
        .map_err(|_| Error::CorruptState(format!("elapsed time {seconds} is out of range")))?;
    Ok(Some(duration))
}

fn read_success(path: &Path) -> Result<bool> {
    let text = read_text(path)?;
    match text.as_str() {
        "True" => Ok(true),
        "False" => Ok(false),
        other => Err(Error::CorruptState(format!(
            "unexpected success flag '{other}'"
        ))),
    }
}
