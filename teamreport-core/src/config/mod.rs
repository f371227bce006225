//! Run configuration for teamreport.
//!
//! Configuration is an explicit value handed to the orchestrator at start-up;
//! nothing here is process-wide state.
//!
//! # Module Structure
//! - `app`: registered application keys and API endpoints
//! - `http`: HTTP client and pagination tuning

mod app;
mod http;

pub use app::{ApiEndpoints, AppConfig, AppKey};
pub use http::{HttpConfig, PaginationConfig};
