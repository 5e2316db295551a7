use crate::common::*;

/// The parsed annotation of one image, without image pixels.
///
/// Boxes are in absolute pixel corners and `classes[i]` labels `boxes[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub(super) image_path: PathBuf,
    pub(super) size: HW<usize>,
    pub(super) classes: Vec<u32>,
    pub(super) boxes: Vec<Corners<f32>>,
}

impl AnnotationRecord {
    pub fn new(
        image_path: impl Into<PathBuf>,
        size: HW<usize>,
        classes: Vec<u32>,
        boxes: Vec<Corners<f32>>,
    ) -> Result<Self> {
        let image_path = image_path.into();
        if classes.len() != boxes.len() {
            return Err(Error::Parse {
                reason: format!(
                    "{} classes do not match {} boxes",
                    classes.len(),
                    boxes.len()
                ),
                path: image_path,
                line: 0,
            });
        }

        Ok(Self {
            image_path,
            size,
            classes,
            boxes,
        })
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// The image size in pixels.
    pub fn size(&self) -> &HW<usize> {
        &self.size
    }

    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    pub fn boxes(&self) -> &[Corners<f32>] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Decoded image pixels with the boxes of the image.
///
/// The image has shape `[height, width, 3]` with raw intensities.
#[derive(Debug, Clone)]
pub struct Sample {
    pub image: Array3<f32>,
    pub classes: Vec<u32>,
    pub boxes: Vec<Corners<f32>>,
}

impl Sample {
    pub fn size(&self) -> HW<usize> {
        let (height, width, _) = self.image.dim();
        HW::from_hw([height, width])
    }
}
