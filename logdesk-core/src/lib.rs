//! # logdesk-core
//!
//! Core library for logdesk - an operations console for the LogCollector
//! incident service.
//!
//! This library provides:
//! - Typed wire records for logs, incidents, rankings and KB articles
//! - Timestamp normalization across the backend's serialization shapes
//! - An HTTP client behind the [`ConsoleApi`] trait
//! - Background dispatch with last-request-wins sequencing
//! - The log generator, ranking boards and system check
//! - Configuration and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logdesk_core::{ApiClient, BlockingApi, Config, LogQuery};
//!
//! let config = Config::load().expect("failed to load config");
//! let client = ApiClient::new(&config.api).expect("invalid API config");
//! let api = BlockingApi::new(Arc::new(client)).expect("failed to start runtime");
//!
//! let page = api.search_logs(&LogQuery::default()).expect("request failed");
//! for log in &page.content {
//!     println!("{} {}", log.service(), log.display_message());
//! }
//! ```

// Re-export commonly used items at the crate root
pub use api::{ApiClient, BlockingApi, ConsoleApi, Dispatcher};
pub use config::Config;
pub use error::{Error, Result};
pub use timestamp::{format_server_time, ServerTimestamp};
pub use types::*;

// Public modules
pub mod api;
pub mod checks;
pub mod config;
pub mod error;
pub mod format;
pub mod generator;
pub mod logging;
pub mod ranking;
pub mod timestamp;
pub mod types;
