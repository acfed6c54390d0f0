//! Version selection subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     fixed DEFAULT_VERSION → VersionStore::fixed
//!     otherwise             → poller.rs initial fetch (fatal on failure)
//!                           → VersionStore::polling + background VersionPoller
//!
//! Per request:
//!     resolver.rs: ?version= > version-override cookie > store default
//!     → path prefixed with the escaped version
//!     → cookie + no-store on the response when pinned by the request
//! ```

pub mod poller;
pub mod resolver;
pub mod store;

pub use poller::{OriginVersionSource, VersionPoller, VersionSource};
pub use resolver::{resolve, resolve_version, ResolvedFrom, ResolvedVersion, VERSION_COOKIE};
pub use store::{VersionMode, VersionState, VersionStore};
