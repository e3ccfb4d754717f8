//! Bounded-wait read/write locks over hierarchical resource paths.
//!
//! A lock request names a path of segments such as `[space]`,
//! `[space, chart]`, or `[space, chart, version]`. A write request
//! read-locks every ancestor in order and write-locks the final node; a read
//! request read-locks every node. Concurrent readers on siblings proceed,
//! sibling writers proceed, and a writer on a node excludes both writers and
//! readers of that node.
//!
//! Every acquisition is bounded by a deadline. If any step times out, all
//! earlier acquisitions of the request are rolled back in reverse order and
//! the caller observes a timeout — never a hang, and never a leaked lock.
//!
//! # Key Types
//!
//! - [`RawRwLock`] — the deadline-bounded R/W primitive
//! - [`ResourceLocker`] — the lazily grown lock tree
//! - [`ResourceLock`] — a path handle produced by [`ResourceLocker::get`]
//! - [`ResourceGuard`] — RAII release of a granted acquisition

pub mod raw;
pub mod resource;

pub use raw::{Deadline, RawRwLock, TIMEOUT_IMMEDIATE, TIMEOUT_INFINITE};
pub use resource::{LockMode, ResourceGuard, ResourceLock, ResourceLocker};
