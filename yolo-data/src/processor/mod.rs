//! Image decoding and joint image/box transforms.

mod backend;
mod jittered_resize;
mod loader;

pub use backend::*;
pub use jittered_resize::*;
pub use loader::*;
