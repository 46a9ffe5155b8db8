//! Objective-function wrapper that records the minimization trajectory.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::trajectory::TrajectoryBuffer;

/// Counts probe constructions within one execution context.
///
/// A second probe registered on the same counter is legal (e.g. independent
/// parallel runs) but usually indicates an accidental duplicate wrapper in a
/// single run, so the counter emits a warn-level diagnostic rather than an
/// error. Each probe keeps its own evaluation count; counts are never
/// merged.
///
/// [`ObjectiveProbe::new`] registers on a process-wide counter. Callers who
/// construct probes deliberately (one per worker, say) can own a counter
/// per context and use [`ObjectiveProbe::with_counter`] instead.
pub struct ProbeCounter {
    created: AtomicU64,
}

impl ProbeCounter {
    /// Create a counter with no registered probes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
        }
    }

    /// Register one probe construction and return the running total.
    pub fn register(&self) -> u64 {
        let count = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        if count > 1 {
            tracing::warn!(
                instances = count,
                "multiple objective probes registered on one counter; if this \
                 is intentional the warning can be ignored, otherwise a probe \
                 was likely duplicated and evaluation counts will diverge"
            );
        }
        count
    }

    /// The number of probes registered so far.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }
}

impl Default for ProbeCounter {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_PROBES: ProbeCounter = ProbeCounter::new();

/// Wraps an objective function, counts evaluations, and records every
/// improvement into an owned [`TrajectoryBuffer`].
///
/// The probe assumes a single logical evaluator: it is mutated only by
/// sequential [`evaluate`](Self::evaluate) calls. Moving a probe to worker
/// threads of a parallel evaluator produces independent, non-merged
/// counters per probe.
///
/// # Examples
///
/// ```
/// use orgmin::ObjectiveProbe;
///
/// let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
/// let mut probe = ObjectiveProbe::new(sphere, 2);
///
/// probe.evaluate(&[3.0, 4.0]);
/// probe.evaluate(&[0.0, 1.0]);
/// probe.evaluate(&[2.0, 2.0]);
///
/// assert_eq!(probe.evaluations(), 3);
/// assert_eq!(probe.f_min(), 1.0);
/// assert_eq!(probe.history().len(), 2);
/// ```
pub struct ObjectiveProbe<F> {
    target: F,
    evaluations: u64,
    f_min: f64,
    x_best: Option<Vec<f64>>,
    history: TrajectoryBuffer,
}

impl<F: FnMut(&[f64]) -> f64> ObjectiveProbe<F> {
    /// Wrap `target`, a function of points with `dim` elements.
    ///
    /// Registers on a process-wide [`ProbeCounter`]; constructing more than
    /// one probe this way logs a warn-level diagnostic.
    pub fn new(target: F, dim: usize) -> Self {
        GLOBAL_PROBES.register();
        Self::build(target, dim)
    }

    /// Wrap `target`, registering on a caller-owned counter.
    pub fn with_counter(target: F, dim: usize, counter: &ProbeCounter) -> Self {
        counter.register();
        Self::build(target, dim)
    }

    fn build(target: F, dim: usize) -> Self {
        Self {
            target,
            evaluations: 0,
            f_min: f64::INFINITY,
            x_best: None,
            history: TrajectoryBuffer::with_dim(dim),
        }
    }

    /// Evaluate the wrapped objective at `x` and return its value unchanged.
    ///
    /// Increments the evaluation counter; if the value strictly improves on
    /// the best seen so far, updates the best value and point and appends a
    /// triple to the owned trajectory buffer.
    pub fn evaluate(&mut self, x: &[f64]) -> f64 {
        let result = (self.target)(x);
        self.evaluations += 1;

        if result < self.f_min {
            self.f_min = result;
            self.x_best = Some(x.to_vec());
            if let Err(err) = self.history.append(self.evaluations, result, x) {
                tracing::warn!(%err, "dropping trajectory entry for mis-sized point");
            }
        }
        result
    }
}

impl<F> ObjectiveProbe<F> {
    /// The number of `evaluate` calls so far.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// The best objective value seen so far, `f64::INFINITY` before the
    /// first evaluation.
    #[must_use]
    pub fn f_min(&self) -> f64 {
        self.f_min
    }

    /// The point that produced the best value, if any evaluation happened.
    #[must_use]
    pub fn x_best(&self) -> Option<&[f64]> {
        self.x_best.as_deref()
    }

    /// The recorded trajectory.
    #[must_use]
    pub fn history(&self) -> &TrajectoryBuffer {
        &self.history
    }

    /// Mutable access to the trajectory, e.g. for timing and the success
    /// flag.
    pub fn history_mut(&mut self) -> &mut TrajectoryBuffer {
        &mut self.history
    }

    /// Consume the probe and keep only its trajectory.
    #[must_use]
    pub fn into_history(self) -> TrajectoryBuffer {
        self.history
    }
}

impl<F> fmt::Debug for ObjectiveProbe<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveProbe")
            .field("evaluations", &self.evaluations)
            .field("f_min", &self.f_min)
            .field("x_best", &self.x_best)
            .field("history_len", &self.history.len())
            .finish()
    }
}
