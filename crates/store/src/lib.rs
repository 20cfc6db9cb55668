//! Storage for inventory items, orders, order lines and profiles.
//!
//! Two backends implement the same traits: [`InMemoryStore`] for tests and
//! local runs, and [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use error::{OrderWriteError, Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::OrderQuery;
pub use record::{
    InventoryItem, InventoryItemPatch, NewInventoryItem, OrderLineRecord, OrderRecord, Profile,
};
pub use store::{
    DecrementMode, DecrementOutcome, InventoryStore, LineStream, OrderStore, OrderStoreExt,
    ProfileStore, StatusUpdate, Store,
};
