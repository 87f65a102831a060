pub mod auth;
pub mod client;
pub mod error;
pub mod range;
pub mod types;

pub use auth::load_access_token;
pub use client::SheetsClient;
pub use error::SheetsError;
pub use range::a1_range;
pub use types::{AppendResponse, ValueRange};
