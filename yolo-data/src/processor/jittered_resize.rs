use super::{ImageBackend, ImageRsBackend};
use crate::{common::*, dataset::Sample};

/// The initializer of [JitteredResize].
#[derive(Debug, Clone, PartialEq)]
pub struct JitteredResizeInit {
    /// The output size.
    pub target_size: HW<usize>,
    /// The range of the random scaling factor. If unset, the image is resized exactly to the
    /// target size.
    pub scale_range: Option<(R64, R64)>,
    /// The intensity of padded pixels.
    pub fill_value: f32,
}

impl JitteredResizeInit {
    pub fn build(self) -> Result<JitteredResize> {
        let Self {
            target_size,
            scale_range,
            fill_value,
        } = self;

        if target_size.h() == 0 || target_size.w() == 0 {
            return Err(Error::Config(format!(
                "target size must be positive, but get {:?}",
                target_size.hw()
            )));
        }
        if !fill_value.is_finite() {
            return Err(Error::Config("fill value must be finite".into()));
        }
        let scale_range = scale_range
            .map(|(lo, hi)| {
                if lo <= 0.0 || hi <= 0.0 {
                    return Err(Error::Config("scale bounds must be positive".into()));
                }
                if lo > hi {
                    return Err(Error::Config(
                        "scale min must not exceed scale max".into(),
                    ));
                }
                Ok((lo.raw(), hi.raw()))
            })
            .transpose()?;

        Ok(JitteredResize {
            target_size,
            scale_range,
            fill_value,
            backend: Arc::new(ImageRsBackend),
        })
    }
}

/// Random scale jitter followed by a crop or pad to a fixed size.
///
/// The image is resized by a random factor `s` relative to the target size, then cropped at
/// a random offset if it is larger than the target, or padded at the bottom and right if it is
/// smaller. Boxes go through the same scaling and offset, are clipped to the output window and
/// dropped along with their classes if nothing remains.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct JitteredResize {
    target_size: HW<usize>,
    scale_range: Option<(f64, f64)>,
    fill_value: f32,
    #[derivative(Debug = "ignore")]
    backend: Arc<dyn ImageBackend>,
}

impl JitteredResize {
    /// Replace the image backend used for resizing.
    pub fn with_backend(self, backend: Arc<dyn ImageBackend>) -> Self {
        Self { backend, ..self }
    }

    pub fn target_size(&self) -> &HW<usize> {
        &self.target_size
    }

    /// Transform an image together with its boxes.
    ///
    /// The random draws only come from `rng`, in the order of scale, vertical offset and
    /// horizontal offset.
    pub fn forward<R>(
        &self,
        image: ArrayView3<'_, f32>,
        classes: &[u32],
        boxes: &[Corners<f32>],
        rng: &mut R,
    ) -> Result<(Array3<f32>, Vec<u32>, Vec<Corners<f32>>)>
    where
        R: Rng + ?Sized,
    {
        let (src_h, src_w, channels) = image.dim();
        if channels != 3 {
            return Err(Error::Augment(format!(
                "expect 3 channels, but get {}",
                channels
            )));
        }
        if src_h == 0 || src_w == 0 {
            return Err(Error::Augment("cannot resize an empty image".into()));
        }
        if classes.len() != boxes.len() {
            return Err(Error::Augment(format!(
                "{} classes do not match {} boxes",
                classes.len(),
                boxes.len()
            )));
        }

        let [tgt_h, tgt_w] = self.target_size.hw();

        // draw random scale
        let scale = match self.scale_range {
            Some((lo, hi)) => rng.gen_range(lo..=hi),
            None => 1.0,
        };
        let inter_h = ((tgt_h as f64 * scale).round() as usize).max(1);
        let inter_w = ((tgt_w as f64 * scale).round() as usize).max(1);

        // draw crop offsets
        let off_y = if inter_h > tgt_h {
            rng.gen_range(0..=(inter_h - tgt_h))
        } else {
            0
        };
        let off_x = if inter_w > tgt_w {
            rng.gen_range(0..=(inter_w - tgt_w))
        } else {
            0
        };

        // resize, then crop or pad
        let resized = self
            .backend
            .resize(image, &HW::from_hw([inter_h, inter_w]))
            .map_err(|err| Error::Augment(format!("resize failed: {}", err)))?;
        let copy_h = inter_h.min(tgt_h);
        let copy_w = inter_w.min(tgt_w);

        let mut output = Array3::from_elem((tgt_h, tgt_w, 3), self.fill_value);
        output
            .slice_mut(s![..copy_h, ..copy_w, ..])
            .assign(&resized.slice(s![off_y..(off_y + copy_h), off_x..(off_x + copy_w), ..]));

        // transform boxes
        let transform: Transform<f32> = Transform::scale_then_shift(
            inter_w as f64 / src_w as f64,
            inter_h as f64 / src_h as f64,
            off_x as f64,
            off_y as f64,
        )
        .cast();
        let window: HW<f32> = self.target_size.cast();

        let (new_classes, new_boxes): (Vec<_>, Vec<_>) = classes
            .iter()
            .zip(boxes)
            .filter_map(|(&class, rect)| {
                let rect = (&transform * rect).clip_to(&window)?;
                Some((class, rect))
            })
            .unzip();

        Ok((output, new_classes, new_boxes))
    }

    pub fn forward_sample<R>(&self, sample: &Sample, rng: &mut R) -> Result<Sample>
    where
        R: Rng + ?Sized,
    {
        let (image, classes, boxes) =
            self.forward(sample.image.view(), &sample.classes, &sample.boxes, rng)?;
        Ok(Sample {
            image,
            classes,
            boxes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn build(target: [usize; 2], scale_range: Option<(f64, f64)>) -> JitteredResize {
        JitteredResizeInit {
            target_size: HW::from_hw(target),
            scale_range: scale_range.map(|(lo, hi)| (r64(lo), r64(hi))),
            fill_value: -1.0,
        }
        .build()
        .unwrap()
    }

    fn assert_corners(rect: &Corners<f32>, expect: [f32; 4]) {
        rect.xyxy()
            .iter()
            .zip(expect)
            .for_each(|(&lhs, rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-4));
    }

    #[test]
    fn exact_resize_without_jitter() {
        let resize = build([8, 16], None);
        let image = Array3::from_elem((4, 8, 3), 100.0);
        let boxes = [Corners::from_xyxy([1.0, 1.0, 3.0, 2.0])];
        let mut rng = StdRng::seed_from_u64(0);

        let (output, classes, boxes) = resize
            .forward(image.view(), &[5], &boxes, &mut rng)
            .unwrap();

        assert_eq!(output.dim(), (8, 16, 3));
        output
            .iter()
            .for_each(|&value| assert_abs_diff_eq!(value, 100.0, epsilon = 1e-3));
        assert_eq!(classes, [5]);
        assert_corners(&boxes[0], [2.0, 2.0, 6.0, 4.0]);
    }

    #[test]
    fn pad_and_drop_outside_boxes() {
        let resize = build([10, 10], Some((0.5, 0.5)));
        let image = Array3::from_elem((10, 10, 3), 7.0);
        let boxes = [
            Corners::from_xyxy([2.0, 2.0, 6.0, 4.0]),
            Corners::from_xyxy([30.0, 30.0, 40.0, 40.0]),
            Corners::from_xyxy([8.0, 0.0, 14.0, 4.0]),
        ];
        let mut rng = StdRng::seed_from_u64(1);

        let (output, classes, boxes) = resize
            .forward(image.view(), &[0, 1, 2], &boxes, &mut rng)
            .unwrap();

        // content stays at the top-left corner
        assert_abs_diff_eq!(output[[0, 0, 0]], 7.0, epsilon = 1e-3);
        assert_abs_diff_eq!(output[[4, 4, 2]], 7.0, epsilon = 1e-3);
        assert_eq!(output[[5, 0, 0]], -1.0);
        assert_eq!(output[[9, 9, 1]], -1.0);

        assert_eq!(classes, [0, 2]);
        assert_corners(&boxes[0], [1.0, 1.0, 3.0, 2.0]);
        assert_corners(&boxes[1], [4.0, 0.0, 7.0, 2.0]);
    }

    #[test]
    fn crop_keeps_boxes_in_window() {
        let resize = build([16, 12], Some((0.8, 1.6)));
        let image = Array3::from_elem((20, 30, 3), 50.0);
        let classes: Vec<u32> = (0..4).collect();
        let boxes = [
            Corners::from_xyxy([0.0, 0.0, 30.0, 20.0]),
            Corners::from_xyxy([0.0, 0.0, 2.0, 2.0]),
            Corners::from_xyxy([25.0, 15.0, 35.0, 25.0]),
            Corners::from_xyxy([10.0, 5.0, 20.0, 12.0]),
        ];

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (output, new_classes, new_boxes) = resize
                .forward(image.view(), &classes, &boxes, &mut rng)
                .unwrap();

            assert_eq!(output.dim(), (16, 12, 3));
            assert_eq!(new_classes.len(), new_boxes.len());
            // the box covering the whole image always survives
            assert_eq!(new_classes.first(), Some(&0));

            for rect in &new_boxes {
                assert!(rect.l() >= 0.0 && rect.r() <= 12.0);
                assert!(rect.t() >= 0.0 && rect.b() <= 16.0);
                assert!(rect.r() > rect.l() && rect.b() > rect.t());
            }
        }
    }

    #[test]
    fn same_seed_same_output() {
        let resize = build([32, 32], Some((0.5, 2.0)));
        let image = Array3::from_shape_fn((24, 40, 3), |(y, x, c)| (y * 40 + x + c) as f32);
        let boxes = [Corners::from_xyxy([4.0, 4.0, 20.0, 16.0])];

        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            resize
                .forward(image.view(), &[1], &boxes, &mut rng)
                .unwrap()
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn reject_invalid_init() {
        let init = JitteredResizeInit {
            target_size: HW::from_hw([0, 10]),
            scale_range: None,
            fill_value: 0.0,
        };
        assert!(matches!(init.build(), Err(Error::Config(_))));

        let init = JitteredResizeInit {
            target_size: HW::from_hw([10, 10]),
            scale_range: Some((r64(1.2), r64(0.8))),
            fill_value: 0.0,
        };
        assert!(matches!(init.build(), Err(Error::Config(_))));
    }
}
