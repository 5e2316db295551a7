//! Dataset indexing, parsing and in-memory storage.

mod annotation;
mod index;
mod ragged;
mod record;
mod store;
mod utils;

pub use annotation::*;
pub use index::*;
pub use ragged::*;
pub use record::*;
pub use store::*;
pub use utils::*;
