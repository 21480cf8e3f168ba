//! HTTP handlers for quiz-service.

pub mod health;
pub mod insight;
pub mod questions;
pub mod quiz_starts;
pub mod responses;
pub mod settings;
pub mod webhook;

pub use health::*;
pub use insight::*;
pub use questions::*;
pub use quiz_starts::*;
pub use responses::*;
pub use settings::*;
pub use webhook::*;
