//! Shuffling, batching and prefetching of augmented samples.

mod batch;
mod shuffle;
mod stream;

pub use batch::*;
pub use shuffle::*;
pub use stream::*;
