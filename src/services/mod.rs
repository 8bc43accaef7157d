pub mod calendar_service;
pub mod image_service;
pub mod llm_service;
pub mod normalizer;
pub mod prompt_builder;
pub mod rate_limit;
pub mod worksheet_service;

pub use image_service::ImageService;
pub use llm_service::{generate_with_fallback, candidate_order, LlmService, ModelInvoker};
pub use normalizer::OutputNormalizer;
pub use prompt_builder::PromptBuilder;
pub use rate_limit::RateLimiter;
pub use worksheet_service::{WorksheetBlock, WorksheetService};
