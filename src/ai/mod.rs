pub mod credentials;
pub mod http_client;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod retry;

pub use credentials::*;
pub use orchestrator::*;
pub use providers::*;
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};
