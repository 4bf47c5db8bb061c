//! Cross-process lock store.

mod store;

pub use store::{percent_mil, LockRecord, LockStore};
