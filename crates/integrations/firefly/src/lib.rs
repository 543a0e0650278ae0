//! Firefly III dispatcher for refire.
//!
//! This crate implements the [`Dispatcher`](refire_provider::Dispatcher)
//! trait by calling the ledger's "trigger transaction" endpoint for a
//! configured webhook, so that the webhook fires again for that transaction.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use refire_firefly::{FireflyConfig, FireflyDispatcher};
//!
//! let config = FireflyConfig::new("https://demo.firefly-iii.org")
//!     .with_webhook_id("3")
//!     .with_api_key("personal-access-token");
//! let dispatcher = FireflyDispatcher::new(config).expect("valid config");
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;

pub use config::FireflyConfig;
pub use dispatcher::FireflyDispatcher;
pub use error::FireflyError;
