//! Flat key→bytes storage backends for the chart registry.
//!
//! The registry core consumes storage through the [`StorageDriver`] trait: a
//! filesystem-like key/value contract with direct-descendant listing and
//! recursive delete. Drivers never interpret values; the object layout on
//! top of them is owned by `chartreg-store`.
//!
//! # Backends
//!
//! - [`InMemoryDriver`] — map-based store for tests and embedding
//! - [`FilesystemDriver`] — keys mapped beneath a root directory
//!
//! # Design Rules
//!
//! 1. All operations are synchronous; drivers are internally thread-safe.
//! 2. A missing key is a distinct, classifiable failure ([`DriverError::NotFound`]).
//! 3. `list` returns full key paths of direct descendants only.
//! 4. `delete` removes a key or an entire prefix subtree.

pub mod error;
pub mod factory;
pub mod filesystem;
pub mod memory;
pub mod traits;

pub use error::{DriverError, DriverResult};
pub use factory::{create_driver, DriverParameters};
pub use filesystem::FilesystemDriver;
pub use memory::InMemoryDriver;
pub use traits::{FileInfo, StorageDriver};
