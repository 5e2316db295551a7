use super::{Corners, CxCyWH, HW};
use crate::common::*;

/// The generic axis-aligned rectangle.
///
/// The x axis runs along image columns and the y axis along image rows.
pub trait Rect {
    type Type;

    fn l(&self) -> Self::Type;
    fn t(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_cxcywh(cxcywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_xyxy(xyxy: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_xyxy(xyxy).unwrap()
    }

    fn from_cxcywh(cxcywh: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_cxcywh(cxcywh).unwrap()
    }

    /// Corner coordinates in `[xmin, ymin, xmax, ymax]` order.
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }

    fn to_cxcywh(&self) -> CxCyWH<Self::Type> {
        CxCyWH {
            cx: self.cx(),
            cy: self.cy(),
            w: self.w(),
            h: self.h(),
        }
    }
}

impl<R> RectNum for R
where
    R: Rect,
    R::Type: Num + PartialOrd,
{
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Compute the overlapping region, or `None` if the two do not overlap.
    fn intersect_with<R>(&self, other: &R) -> Option<Corners<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let l = self.l().max(other.l());
        let t = self.t().max(other.t());
        let r = self.r().min(other.r());
        let b = self.b().min(other.b());
        (r > l && b > t).then(|| Corners { l, t, r, b })
    }

    /// Clip to the `[0, w] x [0, h]` window.
    ///
    /// It returns `None` if nothing of the rectangle is left inside the window.
    fn clip_to(&self, size: &HW<Self::Type>) -> Option<Corners<Self::Type>> {
        let zero = Self::Type::zero();
        let window = Corners {
            l: zero,
            t: zero,
            r: size.w(),
            b: size.h(),
        };
        self.intersect_with(&window)
    }
}

impl<R> RectFloat for R
where
    R: RectNum,
    R::Type: Float,
{
}
