use super::{ImageBackend, ImageRsBackend};
use crate::{
    common::*,
    dataset::{RecordRef, Sample},
};

/// Decodes image files into pixel arrays.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    backend: Arc<dyn ImageBackend>,
}

impl Default for SampleLoader {
    fn default() -> Self {
        Self::new(Arc::new(ImageRsBackend))
    }
}

impl SampleLoader {
    pub fn new(backend: Arc<dyn ImageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn ImageBackend> {
        &self.backend
    }

    /// Read and decode an image into a `[height, width, 3]` array of raw intensities.
    pub fn load(&self, image_path: impl AsRef<Path>) -> Result<Array3<f32>> {
        let image_path = image_path.as_ref();
        let bytes = fs::read(image_path).map_err(|err| Error::decode(image_path, err))?;
        self.backend
            .decode(&bytes)
            .map_err(|err| Error::decode(image_path, err))
    }

    /// Decode the image of a record and attach its annotations.
    ///
    /// The decoded size must agree with the size recorded at parsing time.
    pub fn load_sample(&self, record: &RecordRef<'_>) -> Result<Sample> {
        let image = self.load(record.image_path)?;
        let sample = Sample {
            image,
            classes: record.classes.to_vec(),
            boxes: record.boxes.to_vec(),
        };

        let size = sample.size();
        if &size != record.size {
            return Err(Error::decode(
                record.image_path,
                format!(
                    "decoded size {:?} differs from header size {:?}",
                    size.hw(),
                    record.size.hw()
                ),
            ));
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AnnotationRecord, RecordStore};

    #[test]
    fn load_sample_with_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        image::RgbImage::from_pixel(7, 4, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let boxes = vec![Corners::from_xyxy([1.0, 1.0, 3.0, 2.0])];
        let record =
            AnnotationRecord::new(&path, HW::from_hw([4, 7]), vec![3], boxes.clone()).unwrap();
        let store = RecordStore::from_records([record]);

        let sample = SampleLoader::default()
            .load_sample(&store.get(0).unwrap())
            .unwrap();
        assert_eq!(sample.image.dim(), (4, 7, 3));
        assert_eq!(sample.image[[3, 6, 2]], 30.0);
        assert_eq!(sample.classes, [3]);
        assert_eq!(sample.boxes, boxes);
    }

    #[test]
    fn load_corrupt_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not a jpeg").unwrap();

        let loader = SampleLoader::default();
        assert!(matches!(loader.load(&path), Err(Error::Decode { .. })));
        assert!(matches!(
            loader.load(dir.path().join("missing.jpg")),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn reject_size_disagreement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        image::RgbImage::new(8, 8).save(&path).unwrap();

        let record = AnnotationRecord::new(&path, HW::from_hw([4, 8]), vec![], vec![]).unwrap();
        let store = RecordStore::from_records([record]);

        let result = SampleLoader::default().load_sample(&store.get(0).unwrap());
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
