//! Persistence layer for the commerce system.
//!
//! The [`Store`] trait opens atomic multi-document transactions over the
//! catalog, carts, orders, and the stock audit trail. A [`StoreTx`] is an
//! explicit unit of work: reads observe a consistent snapshot, writes are
//! staged, `commit` publishes everything at once, and dropping the
//! transaction un-committed discards every staged write.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{Store, StoreTx};
