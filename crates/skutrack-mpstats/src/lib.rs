pub mod client;
pub mod delta;
pub mod error;
pub mod types;

pub use client::MpstatsClient;
pub use delta::sales_delta;
pub use error::MpstatsError;
pub use types::DayRecord;
