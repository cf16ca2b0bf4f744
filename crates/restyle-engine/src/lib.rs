pub mod analyzer;
pub mod enhance;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod singleflight;
pub mod vision;

pub use analyzer::SceneAnalyzer;
pub use error::AnalysisError;
pub use filter::AffordanceFilter;
pub use pipeline::ContextPipeline;
pub use singleflight::SingleFlight;
pub use vision::{HttpVisionProvider, ImageRef, VisionProvider};
