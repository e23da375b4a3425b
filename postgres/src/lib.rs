//! `PostgreSQL` post store for the post bridge.
//!
//! This crate provides [`PostgresPostStore`], a [`PostStore`] backed by a
//! single `posts` table keyed by `(country, id)`. It uses sqlx with a
//! connection pool and ships its schema as embedded migrations.
//!
//! # Example
//!
//! ```ignore
//! use post_bridge_postgres::PostgresPostStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresPostStore::connect("postgres://localhost/posts", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```
//!
//! [`PostStore`]: post_bridge_core::store::PostStore

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod post_store;

pub use post_store::PostgresPostStore;
