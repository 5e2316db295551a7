use super::{Corners, Rect, HW};
use crate::{common::*, RectNum};

/// Bounding box in center format (cx, cy, w, h).
///
/// YOLO text annotations store boxes this way, normalized to the image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CxCyWH<T> {
    pub(crate) cx: T,
    pub(crate) cy: T,
    pub(crate) w: T,
    pub(crate) h: T,
}

impl<T> CxCyWH<T> {
    pub fn try_cast<V>(self) -> Option<CxCyWH<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(CxCyWH {
            cx: V::from(self.cx)?,
            cy: V::from(self.cy)?,
            w: V::from(self.w)?,
            h: V::from(self.h)?,
        })
    }

    pub fn cast<V>(self) -> CxCyWH<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> CxCyWH<T>
where
    T: Float,
{
    /// Convert a box normalized to `[0, 1]` into rounded pixel corners of an image of `size`.
    ///
    /// The top-left corner is rounded from the center minus half the extent, and the
    /// bottom-right corner adds the rounded extent to it, so the box size is exactly
    /// `round(w * width)` by `round(h * height)`.
    pub fn to_pixel_corners(&self, size: &HW<T>) -> Corners<T> {
        let two = T::one() + T::one();
        let [img_h, img_w] = [size.h(), size.w()];
        let box_w = self.w * img_w;
        let box_h = self.h * img_h;

        let l = (self.cx * img_w - box_w / two).round();
        let t = (self.cy * img_h - box_h / two).round();
        let r = l + box_w.round();
        let b = t + box_h.round();

        Corners { l, t, r, b }
    }
}

impl<T> Rect for CxCyWH<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn l(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.cx - self.w / two
    }

    fn t(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.cy - self.h / two
    }

    fn r(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.cx + self.w / two
    }

    fn b(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.cy + self.h / two
    }

    fn cx(&self) -> Self::Type {
        self.cx
    }

    fn cy(&self) -> Self::Type {
        self.cy
    }

    fn w(&self) -> Self::Type {
        self.w
    }

    fn h(&self) -> Self::Type {
        self.h
    }

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self> {
        let corners = Corners::try_from_xyxy(xyxy)?;
        Ok(corners.to_cxcywh())
    }

    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self> {
        let corners = Corners::try_from_xywh(xywh)?;
        Ok(corners.to_cxcywh())
    }

    fn try_from_cxcywh(cxcywh: [Self::Type; 4]) -> Result<Self> {
        let [cx, cy, w, h] = cxcywh;
        let zero = T::zero();
        ensure!(w >= zero && h >= zero, "w and h must be non-negative");
        Ok(Self { cx, cy, w, h })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_box_to_pixels() {
        let rect = CxCyWH::from_cxcywh([0.5, 0.5, 0.2, 0.2]);
        let corners = rect.to_pixel_corners(&HW::from_hw([640.0, 640.0]));
        assert_eq!(corners.xyxy(), [256.0, 256.0, 384.0, 384.0]);
    }

    #[test]
    fn normalized_box_to_pixels_non_square() {
        // 200 rows by 400 columns
        let rect = CxCyWH::from_cxcywh([0.25, 0.5, 0.1, 0.5]);
        let corners = rect.to_pixel_corners(&HW::from_hw([200.0, 400.0]));
        assert_eq!(corners.xyxy(), [80.0, 50.0, 120.0, 150.0]);
    }
}
