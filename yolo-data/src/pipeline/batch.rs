use crate::{
    common::*,
    dataset::{Ragged, Sample},
};

/// The ragged targets of a batch.
///
/// Row `i` of `classes` labels row `i` of `boxes`. Boxes are `[xmin, ymin, xmax, ymax]` in
/// pixels of the output image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundingBoxes {
    pub classes: Ragged<f32>,
    pub boxes: Ragged<[f32; 4]>,
}

/// A fixed-size group of augmented samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// The pass that produced this batch.
    pub epoch: usize,
    /// The position of this batch within its pass.
    pub index: usize,
    /// Images in shape `[batch, height, width, 3]`.
    pub images: Array4<f32>,
    pub bounding_boxes: BoundingBoxes,
}

impl Batch {
    /// Stack samples of identical image size into a batch.
    pub fn from_samples(epoch: usize, index: usize, samples: Vec<Sample>) -> Result<Self> {
        let first = samples
            .first()
            .ok_or_else(|| Error::Augment("cannot build a batch without samples".into()))?;
        let shape = first.image.dim();
        if let Some(sample) = samples.iter().find(|sample| sample.image.dim() != shape) {
            return Err(Error::Augment(format!(
                "images in a batch must have identical shapes, but get {:?} and {:?}",
                shape,
                sample.image.dim()
            )));
        }

        let images = {
            let views: Vec<_> = samples.iter().map(|sample| sample.image.view()).collect();
            ndarray::stack(Axis(0), &views)
                .map_err(|err| Error::Augment(format!("failed to stack images: {}", err)))?
        };

        let num_boxes = samples.iter().map(|sample| sample.boxes.len()).sum();
        let mut classes = Ragged::with_capacity(samples.len(), num_boxes);
        let mut boxes = Ragged::with_capacity(samples.len(), num_boxes);
        for sample in &samples {
            classes.push(sample.classes.iter().map(|&class| class as f32));
            boxes.push(sample.boxes.iter().map(|rect| rect.xyxy()));
        }

        Ok(Self {
            epoch,
            index,
            images,
            bounding_boxes: BoundingBoxes { classes, boxes },
        })
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into `(images, bounding_boxes)`.
    pub fn into_parts(self) -> (Array4<f32>, BoundingBoxes) {
        (self.images, self.bounding_boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f32, boxes: Vec<Corners<f32>>) -> Sample {
        Sample {
            image: Array3::from_elem((4, 6, 3), value),
            classes: (0..boxes.len() as u32).collect(),
            boxes,
        }
    }

    #[test]
    fn stack_samples() {
        let samples = vec![
            sample(1.0, vec![Corners::from_xyxy([0.0, 0.0, 2.0, 3.0])]),
            sample(2.0, vec![]),
            sample(
                3.0,
                vec![
                    Corners::from_xyxy([1.0, 1.0, 2.0, 2.0]),
                    Corners::from_xyxy([3.0, 0.0, 6.0, 4.0]),
                ],
            ),
        ];

        let batch = Batch::from_samples(2, 5, samples).unwrap();
        assert_eq!((batch.epoch, batch.index, batch.len()), (2, 5, 3));
        assert_eq!(batch.images.dim(), (3, 4, 6, 3));
        assert_eq!(batch.images[[1, 3, 5, 2]], 2.0);

        let (_, targets) = batch.into_parts();
        assert_eq!(targets.classes.offsets(), [0, 1, 1, 3]);
        assert_eq!(targets.classes[2], [0.0, 1.0]);
        assert!(targets.boxes[1].is_empty());
        assert_eq!(targets.boxes[2][1], [3.0, 0.0, 6.0, 4.0]);
    }

    #[test]
    fn reject_mixed_shapes() {
        let mut other = sample(0.0, vec![]);
        other.image = Array3::zeros((5, 6, 3));
        let result = Batch::from_samples(0, 0, vec![sample(0.0, vec![]), other]);
        assert!(matches!(result, Err(Error::Augment(_))));

        assert!(Batch::from_samples(0, 0, vec![]).is_err());
    }
}
