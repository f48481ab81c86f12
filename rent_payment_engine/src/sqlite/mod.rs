//! SQLite backend for the rent payment engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::{SqliteDatabase, EXPIRED_REQUEST_DESC, MIGRATOR};
