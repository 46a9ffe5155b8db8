#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]

//! Bookkeeping for numerical experiments: a flat-file registry that assigns
//! stable sample identifiers to parameter sets and checks schema consistency
//! across repeated runs, plus a growable trajectory buffer that records the
//! evolution of a minimization run and persists it exactly.
//!
//! The crate does not optimize anything itself — it wraps and observes an
//! externally supplied objective function.
//!
//! # Getting Started
//!
//! Wrap an objective, run your optimizer of choice against the probe, and
//! persist what it saw:
//!
//! ```no_run
//! use orgmin::ObjectiveProbe;
//!
//! let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
//! let mut probe = ObjectiveProbe::new(sphere, 2);
//!
//! probe.history_mut().start_timing();
//! // ... hand `|x| probe.evaluate(x)` to an optimizer ...
//! probe.evaluate(&[1.0, -1.0]);
//! probe.history_mut().stop_timing();
//!
//! probe.history().persist("results/10000")?;
//! # Ok::<(), orgmin::Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Registry`] | Catalogue parameter sets into an append-only, schema-checked flat file, one row and one result directory per sample. |
//! | [`ParameterSet`] | Declare your parameter fields once; get cataloguing and schema validation for free. |
//! | [`TrajectoryBuffer`] | Amortized-doubling store of (evaluation count, best value, best point) triples with exact persist/restore. |
//! | [`ObjectiveProbe`] | Wrap an objective function, count calls, record improvements into a buffer. |
//!
//! # Registry layout
//!
//! A registry directory holds `registry.csv` (`;`-delimited, header first,
//! ids monotonically assigned from 10000), a derived `registry.html`
//! mirror, and one `<sample_id>/` subdirectory per catalogued run.
//!
//! # Diagnostics
//!
//! Fatal conditions are [`Error`] values and abort the triggering operation
//! without partial mutation of persisted state. Non-fatal conditions
//! (duplicate probes, redundant timing calls, very large buffer growth) are
//! emitted as [`tracing`](https://docs.rs/tracing) events; install any
//! subscriber to observe them.

mod error;
pub mod params;
pub mod probe;
pub mod registry;
pub mod trajectory;

pub use error::{Error, Result};
pub use params::{ParamValue, ParameterSet};
pub use probe::{ObjectiveProbe, ProbeCounter};
pub use registry::{Registry, RegistryRow};
pub use trajectory::TrajectoryBuffer;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use orgmin::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::params::{ParamValue, ParameterSet};
    pub use crate::probe::{ObjectiveProbe, ProbeCounter};
    pub use crate::registry::{Registry, RegistryRow, SampleAllocator, SchemaStore};
    pub use crate::trajectory::TrajectoryBuffer;
}
