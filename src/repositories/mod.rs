//! Repository layer for database operations.
//!
//! Following the Data Mapper pattern recommended by SeaORM, entities stay
//! pure data models while [`CrudRepository`] provides the reusable database
//! access methods: listing through the query builder, id lookups, writes with
//! a unique-field pre-check, soft delete with restore and purge, and bulk
//! variants.

pub mod base;

pub use base::{safe_execute, CrudRepository};
