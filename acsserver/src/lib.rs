//! # acsserver - Endpoint HTTP de l'ACS
//!
//! Ce crate relie le codec CWMP à un serveur Axum :
//!
//! - [`server`] : serveur HTTP et builder
//! - [`handler`] : endpoint CWMP (`POST /`) et réponses de session
//! - [`logs`] : initialisation du tracing
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use acsserver::{AcsState, CwmpServerExt, ServerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("ACS", "0.0.0.0", 7547).build();
//!     server.init_cwmp(AcsState::new(acscwmp::default_prefixes()), 1 << 20).await;
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod handler;
pub mod logs;
pub mod server;

pub use handler::{ACS_METHODS, AcsState, CwmpServerExt, cwmp_handler, cwmp_router};
pub use logs::{LoggingOptions, init_logging};
pub use server::{Server, ServerBuilder, ServerInfo};
