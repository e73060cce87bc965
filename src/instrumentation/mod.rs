pub mod logger;

pub use logger::{FeedbackLog, RunLog, RunLogger};
