pub mod model;
pub mod gemini;
pub mod service;

pub use gemini::GeminiClient;
pub use service::CoachService;
