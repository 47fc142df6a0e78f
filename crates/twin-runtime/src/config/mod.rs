//! Service configuration.
//!
//! # Sources
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. Environment Variables (TWIN_*)      │  apply_env()
//! ├─────────────────────────────────────────┤
//! │  2. Config file (TOML)                  │  load(path)
//! ├─────────────────────────────────────────┤
//! │  3. Default Values (compile-time)       │  Default
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `TWIN_REQUEST_HANDLER_THREADS` | `core.request_handler_threads` | usize |
//! | `TWIN_SUBSCRIBER_QUEUE_CAPACITY` | `message_bus.subscriber_queue_capacity` | usize |
//!
//! # Example Configuration
//!
//! ```toml
//! [core]
//! request_handler_threads = 4
//!
//! [message_bus]
//! subscriber_queue_capacity = 1024
//! ```

mod error;
mod types;

pub use error::ConfigError;
pub use types::{
    CoreConfig, MessageBusConfig, ServiceConfig, ENV_REQUEST_HANDLER_THREADS,
    ENV_SUBSCRIBER_QUEUE_CAPACITY,
};
