//! The registry's storage engine.
//!
//! [`SpaceManager`] orchestrates the content-addressed object layout over a
//! pluggable storage driver, guarded by the hierarchical lock tree. Handles
//! are layered: a manager yields [`Space`]s, a space yields [`Chart`]s, a
//! chart yields [`Version`]s; every operation validates names before they
//! reach the driver and takes the lock path its level requires.
//!
//! # Consistency model
//!
//! Each version owns four sibling blobs (`chart.tgz`, `metadata.dat`,
//! `values.dat`, `.status`). The status marker is written `LOCKING` before
//! any artifact and flipped to `SUCCESS` only after all artifacts are
//! durable; readers reject anything else, so they observe either the
//! pre-state or the committed post-state. A failed write deletes its own
//! subtree before returning.

pub mod chart;
pub mod layout;
pub mod manager;
pub mod space;
pub mod version;

pub use chart::Chart;
pub use manager::SpaceManager;
pub use space::Space;
pub use version::Version;
