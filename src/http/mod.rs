//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request ID)
//!     → dev_proxy.rs (prefix passthrough, bypasses everything below)
//!     → path.rs (decoded path rewriting, re-encoding)
//!     → cache handler
//!     → response.rs (X-Cache, mapped path)
//!     → Send to client
//! ```

pub mod dev_proxy;
pub mod path;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{MappedPath, X_CACHE};
pub use server::{AppState, HttpServer};
