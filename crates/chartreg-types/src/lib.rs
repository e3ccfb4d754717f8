//! Foundation types for the chart registry.
//!
//! This crate provides the naming grammar, version ordering, chart metadata
//! model, and the registry-wide error taxonomy. Every other chartreg crate
//! depends on `chartreg-types`.
//!
//! # Key Types
//!
//! - [`VersionNumber`] — strict three-part numeric version with component-wise
//!   ordering (`1.2.10` sorts after `1.2.9`)
//! - [`ChartDescriptor`] — the `Chart.yaml` document of a chart bundle
//! - [`Metadata`] — coalesced metadata tree (descriptor + recursive
//!   dependencies)
//! - [`ErrorKind`] / [`RegistryError`] — classified errors with HTTP-like
//!   status codes and identity-based equality

pub mod error;
pub mod metadata;
pub mod name;

pub use error::{ErrorData, ErrorKind, Reason, RegistryError, RegistryResult};
pub use metadata::{ChartDescriptor, Metadata};
pub use name::{is_valid_name, is_valid_version, VersionNumber};
