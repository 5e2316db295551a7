use super::Corners;
use crate::common::*;

/// Per-axis scaling followed by translation.
///
/// A point `(x, y)` maps to `(x * sx + tx, y * sy + ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sx: T,
    pub sy: T,
    pub tx: T,
    pub ty: T,
}

impl<T> Transform<T>
where
    T: Copy + Num,
{
    /// Scale both axes, then shift the origin to `(offset_x, offset_y)`.
    pub fn scale_then_shift(sx: T, sy: T, offset_x: T, offset_y: T) -> Self {
        Self {
            sx,
            sy,
            tx: T::zero() - offset_x,
            ty: T::zero() - offset_y,
        }
    }
}

impl<T> Transform<T> {
    pub fn try_cast<V>(self) -> Option<Transform<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(Transform {
            sx: V::from(self.sx)?,
            sy: V::from(self.sy)?,
            tx: V::from(self.tx)?,
            ty: V::from(self.ty)?,
        })
    }

    pub fn cast<V>(self) -> Transform<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> Mul<&Corners<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = Corners<T>;

    fn mul(self, rhs: &Corners<T>) -> Self::Output {
        Corners {
            l: rhs.l * self.sx + self.tx,
            t: rhs.t * self.sy + self.ty,
            r: rhs.r * self.sx + self.tx,
            b: rhs.b * self.sy + self.ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn transform_scale_then_shift_corners() {
        let transform = Transform::scale_then_shift(1.5, 1.5, 10.0, 20.0);
        let corners = Corners::from_xyxy([10.0, 20.0, 30.0, 40.0]);
        assert_eq!((&transform * &corners).xyxy(), [5.0, 10.0, 35.0, 40.0]);
    }
}
