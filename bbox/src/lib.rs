//! Safe bounding box types and functions.

mod common;

pub use rect::*;
pub mod rect;

pub use corners::*;
pub mod corners;

pub use cxcywh::*;
pub mod cxcywh;

pub use hw::*;
pub mod hw;

pub use transform::*;
mod transform;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}
