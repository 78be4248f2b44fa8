//! # rustible-aos - ArubaOS configuration over REST
//!
//! rustible-aos manages ArubaOS Mobility Masters and Mobility Controllers
//! through their REST configuration API. It owns the authenticated session,
//! pushes configuration idempotently, validates the controller's nested
//! result envelopes and commits pending changes to startup configuration.
//!
//! ## Core Concepts
//!
//! - **Session**: the token obtained at login, attached to every request
//! - **Config path**: the node in the management hierarchy a read or write applies to (`/md/Boston`)
//! - **Idempotent push**: a write wrapped in before/after reads of the node's configuration
//! - **Validation**: the walk over `_global_result` and nested `_result` envelopes
//! - **Commit**: writing pending changes to startup configuration (`write_memory`)
//! - **Modules**: declarative operations built on the above (`aos_vlan`, ...)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Module Registry                             │
//! │        (aos_api_config, aos_show_command, aos_vlan, ...)             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Config Transaction Client                         │
//! │          (get, idempotent post, write_mem, validation)               │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Session Manager                              │
//! │          (login, logout, credential injection, decoding)             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Transport (reqwest / HTTPS)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use rustible_aos::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let api = AosApi::from_config(&config);
//!     let mut context = ModuleContext::new(api.clone());
//!     api.login(&mut context.session, &config.credentials).await?;
//!
//!     let params: ModuleParams = serde_json::from_value(serde_json::json!({
//!         "action": "create",
//!         "vlan_id": 5,
//!         "config_path": "/md/Boston"
//!     }))?;
//!     let output = ModuleRegistry::with_builtins()
//!         .execute("aos_vlan", &params, &mut context)
//!         .await?;
//!     println!("changed: {}", output.changed);
//!
//!     api.http().close(&mut context.session).await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Connection types
    pub use crate::connection::{
        ConnectionError, HostConfig, HttpMethod, HttpRequest, HttpTransport, RawResponse,
        Transport,
    };

    // Session manager
    pub use crate::httpapi::{ApiResponse, HttpApi, ResponseBody, Session, SessionToken};

    // Transaction client
    pub use crate::client::{
        validate, AosApi, ClientError, ConfigPush, ObjectQuery, Payload, QueryModifiers,
        ValidationOutcome,
    };

    // Modules
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleStatus, ParamExt,
    };

    // Configuration
    pub use crate::config::{Config, Credentials};

    // Errors
    pub use crate::error::{Error, Result};

    // Async trait re-export for implementing modules
    pub use async_trait::async_trait;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Configuration transaction client.
pub mod client;

/// Configuration file and environment loading.
pub mod config;

/// Transport layer.
pub mod connection;

/// Error types.
pub mod error;

/// Session manager.
pub mod httpapi;

/// Controller configuration modules.
pub mod modules;

/// Logging and span helpers.
pub mod telemetry;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
