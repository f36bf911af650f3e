//! Transaction identity and access-permission hints.
//!
//! This core does not arbitrate locks between transactions; it only tags
//! page accesses with the requesting transaction and the permission it
//! asked for, so that an external lock manager can enforce isolation.

pub mod id;
pub mod permission;

pub use id::{TransactionId, TransactionIdGenerator};
pub use permission::Permission;
