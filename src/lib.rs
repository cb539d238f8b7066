pub mod api;
pub mod canonical;
pub mod config;
pub mod directory;
pub mod generator;
pub mod llm;
pub mod logging;
pub mod normalize;
pub mod tags;

pub use api::{ApiRequest, ApiResponse, Handler};
pub use canonical::{TeamResolution, resolve};
pub use generator::{MatchRequest, TagGenerator, TagResult};
