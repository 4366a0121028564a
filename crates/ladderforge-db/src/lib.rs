//! Ladderforge-DB: SQLite persistence for jobs and tasks.
//!
//! This crate provides the durable store behind the workflow core:
//!
//! - **Pool**: r2d2-managed SQLite connections ([`pool::init_pool`],
//!   [`pool::init_memory_pool`] for tests)
//! - **Migrations**: embedded, versioned schema migrations run at pool init
//! - **Models**: [`models::Job`] and [`models::Task`] records
//! - **Queries**: per-record atomic operations in [`queries::jobs`] and
//!   [`queries::tasks`]
//!
//! No multi-record transactions are offered; every add/update is
//! all-or-nothing on its own.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use models::{Job, Task};
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
