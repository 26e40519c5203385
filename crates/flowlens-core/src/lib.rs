pub mod actions;
pub mod config;
pub mod datasets;
pub mod debounce;
pub mod filters;
pub mod geometry;
pub mod periods;
pub mod persistence;
pub mod pipeline;
pub mod reducer;
pub mod session;
pub mod state;

pub use actions::*;
pub use config::*;
pub use datasets::*;
pub use debounce::*;
pub use filters::*;
pub use geometry::*;
pub use periods::*;
pub use reducer::*;
pub use session::*;
pub use state::*;

pub use persistence::*;
pub use pipeline::ChartData;
pub use pipeline::ChartStatus;
pub use pipeline::FlowMatrix;
pub use pipeline::MigrationRecord;
pub use pipeline::PipelineError;
pub use pipeline::SeriesRow;
