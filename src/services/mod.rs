mod camera;
mod media;
mod pipeline;
mod search_config;
mod submission;
mod triage;

pub use camera::*;
pub use media::*;
pub use pipeline::*;
pub use search_config::*;
pub use submission::*;
pub use triage::*;
