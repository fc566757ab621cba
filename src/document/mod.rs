//! The synchronization document: section grammar and on-disk store.

pub mod codec;
pub mod store;

pub use codec::{SectionKey, SectionMap, decode, encode};
pub use store::DocumentStore;
