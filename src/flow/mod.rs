//! Flow aggregation module.
//!
//! Groups captured segments into per-flow records keyed by the 4-tuple.

mod flow_table;

pub use flow_table::FlowTable;
