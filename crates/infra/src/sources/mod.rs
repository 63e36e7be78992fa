//! Upstream read adapters (store master records, orders, sentiment, deals,
//! follow-ups).

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySignalSource;
pub use postgres::PostgresSignalSource;
