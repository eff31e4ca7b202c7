pub mod engine;
pub mod validator;

pub use engine::{build_response, BidEvaluator, PlaceholderEvaluator};
pub use validator::{check_required, decode_body, validate};
