//! Meta-crate re-exporting the Sable workspace members.

#[cfg(feature = "protocol")]
pub use sable_protocol as protocol;

#[cfg(feature = "consensus")]
pub use sable_consensus as consensus;

#[cfg(feature = "mempool")]
pub use sable_mempool as mempool;
