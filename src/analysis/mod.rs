pub mod geometry;
pub mod keypoints;
pub mod summarizer;

pub use summarizer::{analyze_throw, render_report};
