use super::Rect;
use crate::common::*;

/// Bounding box in absolute corner format (xmin, ymin, xmax, ymax).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corners<T> {
    pub(crate) l: T,
    pub(crate) t: T,
    pub(crate) r: T,
    pub(crate) b: T,
}

impl<T> Corners<T> {
    pub fn try_cast<V>(self) -> Option<Corners<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(Corners {
            l: V::from(self.l)?,
            t: V::from(self.t)?,
            r: V::from(self.r)?,
            b: V::from(self.b)?,
        })
    }

    pub fn cast<V>(self) -> Corners<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> Rect for Corners<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn l(&self) -> Self::Type {
        self.l
    }

    fn t(&self) -> Self::Type {
        self.t
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn cx(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.l + self.w() / two
    }

    fn cy(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.t + self.h() / two
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self> {
        let [l, t, r, b] = xyxy;
        ensure!(r >= l && b >= t, "xmax >= xmin and ymax >= ymin must hold");
        Ok(Self { l, t, r, b })
    }

    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self> {
        let [l, t, w, h] = xywh;
        Self::try_from_xyxy([l, t, l + w, t + h])
    }

    fn try_from_cxcywh(cxcywh: [Self::Type; 4]) -> Result<Self> {
        let [cx, cy, w, h] = cxcywh;
        let zero = T::zero();
        ensure!(w >= zero && h >= zero, "w and h must be non-negative");

        let two = T::one() + T::one();
        Ok(Self {
            l: cx - w / two,
            t: cy - h / two,
            r: cx + w / two,
            b: cy + h / two,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn corners_rejects_inverted_box() {
        assert!(Corners::try_from_xyxy([4.0, 0.0, 2.0, 1.0]).is_err());
        assert!(Corners::try_from_xyxy([0.0, 3.0, 2.0, 1.0]).is_err());
    }

    #[test]
    fn corners_from_center() {
        let corners = Corners::from_cxcywh([5.0, 4.0, 4.0, 2.0]);
        assert_eq!(corners.xyxy(), [3.0, 3.0, 7.0, 5.0]);
        assert_eq!(
            [corners.cx(), corners.cy(), corners.w(), corners.h()],
            [5.0, 4.0, 4.0, 2.0]
        );
    }

    #[test]
    fn corners_cast() {
        let corners: Corners<f32> = Corners::from_xyxy([1i64, 2, 3, 4]).cast();
        assert_eq!(corners.xyxy(), [1.0, 2.0, 3.0, 4.0]);
    }
}
