// salesflow-core/src/application/mod.rs

pub mod extract;
pub mod load;
pub mod pipeline;
pub mod report;
pub mod seed;
pub mod transform;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI can `use salesflow_core::application::{run_pipeline, load, ...};`
// without knowing the file layout.

pub use extract::{ExtractSummary, extract};
pub use load::{LoadSummary, load};
pub use pipeline::{RunResult, Stage, StageResult, StageStatus, run_pipeline};
pub use report::{RankedTotal, Report, report};
pub use seed::{SeedSummary, seed};
pub use transform::{TransformPaths, run_transform};
