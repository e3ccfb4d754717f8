//! Chart archive packing, unpacking, and coalescing.
//!
//! An archive is a gzip stream wrapping a tar whose layout is
//!
//! ```text
//! {chartName}/Chart.yaml                  descriptor
//! {chartName}/values.yaml                 default values (optional)
//! {chartName}/templates/…                 template files
//! {chartName}/…                           arbitrary extra files
//! {chartName}/charts/{depName}/…          one subtree per dependency, recursive
//! ```
//!
//! The codec never evaluates templates; it yields the descriptor, the raw
//! values document, and a navigable dependency tree. Writers emit entries in
//! the fixed order above for reproducibility; readers tolerate any order.

pub mod bundle;
pub mod codec;
pub mod coalesce;
pub mod error;

pub use bundle::{ChartBundle, ChartFile};
pub use coalesce::{coalesce_metadata, coalesce_values, merge_values};
pub use codec::{pack, unpack, GZIP_COMMENT, GZIP_EXTRA};
pub use error::{ArchiveError, ArchiveResult};
