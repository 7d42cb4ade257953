//! Visual product search client.
//!
//! Acquires a product image from a drop, a file pick, the clipboard or the camera,
//! searches it against the similarity service and splits the ranked matches into
//! search results, similar products and recommendations.

pub mod app_state;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod utils;

pub use app_state::{AppState, PreviewInfo, ResultsView};
pub use error::{AcquireError, AppError, AppResult, CameraError, SubmissionError};
pub use services::{
    acquire, CameraSessionManager, MediaEvent, PresentationSurface, SearchClient, SearchConfig,
    SearchConfigService, SearchOutcome, SearchPipeline, ThirdsTriage, TriageBuckets,
};
