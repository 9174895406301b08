mod client;
mod models;

pub use client::{HttpClient, Result};
#[cfg(test)]
pub use client::FetchError;
pub use models::HttpConfig;
