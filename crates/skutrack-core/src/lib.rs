pub mod app_config;
pub mod config;
pub mod error;
pub mod identifier;
pub mod metrics;
pub mod retry;
pub mod sleep;

pub use app_config::{AppConfig, SalesMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use identifier::{validate, Identifier};
pub use metrics::MetricRecord;
pub use retry::{Classify, RetryPolicy, Verdict};
#[cfg(any(test, feature = "test-util"))]
pub use sleep::RecordingSleeper;
pub use sleep::{Sleeper, TokioSleeper};
