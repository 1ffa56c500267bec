//! `db` crate — persistence layer: typed rows, repository functions, and
//! the `engine::ExecutionStore` implementations (Postgres and in-memory).

pub mod error;
pub mod models;
pub mod pool;
pub mod repository;
pub mod store;

pub use error::DbError;
pub use pool::DbPool;
pub use store::{InMemoryExecutionStore, PgExecutionStore};
