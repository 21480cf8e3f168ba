pub mod validation;

pub use validation::{normalize_email, trimmed, QueryParams, ValidatedJson};
