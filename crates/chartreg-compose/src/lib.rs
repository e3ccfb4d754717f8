//! Orchestration: compose a new chart from a declarative tree of references
//! to charts already in the registry.
//!
//! A configuration node names a base chart through its `package` reference,
//! optionally carries a `_config` values override for that level, and nests
//! further nodes under arbitrary (grammar-checked) keys to become renamed
//! dependencies. The composer resolves the tree against the version store,
//! assembles the override values into a parallel tree, repacks the result,
//! and routes it through the normal write path.

pub mod composer;
pub mod config;

pub use composer::Composer;
pub use config::{ConfigNode, OrchestrationConfig, PackageRef, SaveInfo};
