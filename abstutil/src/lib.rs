//! Utilities shared by the markup crates: logging setup, JSON files, and small collection
//! helpers.

mod collections;
mod io;
pub mod logger;

pub use crate::collections::{contains_duplicates, wraparound_get};
pub use crate::io::{
    deserialize_btreemap, from_json, maybe_read_json, read_json, serialize_btreemap, to_json,
    write_json,
};
