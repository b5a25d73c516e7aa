//! The analysis data model.
//!
//! - [`Analysis`]: per-run aggregate owning every result, the metric
//!   registries and the computed metric tables
//! - [`FileResult`] / [`EntityResult`]: scanned files and the named types
//!   declared in them, sharing the [`CodeResult`] capability set
//! - [`AnalysisSettings`]: source root, filters and resolution policy
//! - [`Statistics`]: counters and phase runtimes

mod context;
mod results;
mod settings;
mod statistics;

use serde::Serialize;

pub use context::Analysis;
pub use results::{CodeResult, EntityResult, FileResult, ResultCore, ResultKind, ResultRef};
pub use settings::{AnalysisSettings, Filters};
pub use statistics::Statistics;

/// Non-owning handle from a result back to its analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AnalysisId(pub u64);

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "analysis#{}", self.0)
    }
}
