//! Vision-model pricing analysis and chat assistance.
//!
//! This crate is the bridge between the HTTP surface and the hosted
//! vision model:
//! - `llm` defines the pluggable `VisionLlm` trait
//! - `gemini` is the production client for the Gemini REST API
//! - `prompt` carries the company pricing policy and prompt templates
//! - `estimator` turns a photo into a validated `PricingAnalysis`
//! - `assistant` produces chat replies for the website widget
//!
//! The model is strictly an appraiser. It proposes a price from the
//! pricing policy and the photo, and everything it returns is validated
//! before any quote is persisted. A reply that fails validation is an
//! error, never a default estimate.

pub mod assistant;
pub mod estimator;
pub mod gemini;
pub mod llm;
pub mod prompt;

pub use assistant::ChatAssistant;
pub use estimator::{EstimateError, PricingEstimator};
pub use gemini::GeminiClient;
pub use llm::{LlmError, VisionLlm};
