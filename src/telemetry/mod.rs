//! Dashboard telemetry tree
//!
//! The camera server publishes per-source metadata into a hierarchical
//! key/value tree that mirrors what networked dashboards consume. The tree
//! lives in memory; bridging it onto a wire protocol is a transport concern
//! handled elsewhere. Watch the root with [`Table::watch`] to forward writes.

pub mod table;
pub mod value;

pub use table::{Table, Update};
pub use value::Value;
