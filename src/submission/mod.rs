pub mod metadata;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod schema;

pub const SUCCESS_MESSAGE: &str = "Evaluation submission Successful!";
pub const FAILURE_MESSAGE: &str = "Evaluation submission failed!";
pub const RATE_LIMITED_MESSAGE: &str = "Too many submissions. Try again later.";
