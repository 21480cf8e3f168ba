pub mod answers;
pub mod cta_config;
pub mod questions;
pub mod quiz_response;
pub mod quiz_start;
pub mod scores;
pub mod utm;

pub use answers::{AnswerSet, AnswerValue, MedicalClearance};
pub use cta_config::{CtaConfig, CtaMode, CtaType};
pub use questions::{Question, QuestionCategory, QuestionKind, QUESTIONS};
pub use quiz_response::{NewQuizResponse, QuizResponse, ResponseFilter};
pub use quiz_start::QuizStart;
pub use scores::{Classification, Scores};
pub use utm::UtmAttribution;
