use super::{
    load_classes_file, AnnotationParser, AnnotationRecord, DatasetIndexBuilder, Ragged,
};
use crate::{
    common::*,
    config::{DatasetConfig, PipelineConfig, Split},
};

/// The immutable in-memory annotations of a split.
///
/// Image paths, sizes, classes and boxes are stored in aligned sequences. Classes and boxes
/// are ragged arrays sharing the same row offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    image_paths: Vec<PathBuf>,
    sizes: Vec<HW<usize>>,
    classes: Ragged<u32>,
    boxes: Ragged<Corners<f32>>,
}

/// A borrowed view of one record in a [RecordStore].
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    pub index: usize,
    pub image_path: &'a Path,
    pub size: &'a HW<usize>,
    pub classes: &'a [u32],
    pub boxes: &'a [Corners<f32>],
}

impl RecordRef<'_> {
    pub fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord {
            image_path: self.image_path.to_owned(),
            size: *self.size,
            classes: self.classes.to_vec(),
            boxes: self.boxes.to_vec(),
        }
    }
}

impl RecordStore {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AnnotationRecord>,
    {
        let mut store = Self::default();
        for record in records {
            store.image_paths.push(record.image_path().to_owned());
            store.sizes.push(*record.size());
            store.classes.push(record.classes().iter().cloned());
            store.boxes.push(record.boxes().iter().cloned());
        }
        store
    }

    /// Index, parse and store the annotations of an image and a label directory.
    ///
    /// Annotation files are parsed in parallel by `num_workers` workers. The first failure
    /// aborts loading.
    pub async fn load(
        images_dir: impl AsRef<Path>,
        labels_dir: impl AsRef<Path>,
        parser: AnnotationParser,
        index_builder: DatasetIndexBuilder,
        num_workers: usize,
    ) -> Result<Self> {
        let images_dir = images_dir.as_ref().to_owned();
        let labels_dir = labels_dir.as_ref().to_owned();

        // list image and label files
        let pairs = tokio::task::spawn_blocking(move || index_builder.build(images_dir, labels_dir))
            .await
            .map_err(|err| Error::Worker(err.to_string()))??;

        // parse annotation files
        let parser = Arc::new(parser);
        let records: Vec<AnnotationRecord> = stream::iter(pairs)
            .par_map(num_workers.max(1), move |(image_path, label_path)| {
                let parser = parser.clone();
                move || parser.parse(image_path, label_path)
            })
            .try_collect()
            .await?;

        let store = Self::from_records(records);
        info!(
            "loaded {} records with {} boxes",
            store.len(),
            store.num_boxes()
        );

        Ok(store)
    }

    /// Load a named split of a dataset.
    ///
    /// The split is expected at `<root>/<split>/images` and `<root>/<split>/labels`.
    pub async fn load_split(
        dataset: &DatasetConfig,
        split: Split,
        config: &PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let parser = {
            let parser = AnnotationParser::new().clamp_boxes(config.clamp_boxes);
            match &dataset.class_names {
                Some(path) => parser.class_names(load_classes_file(path).await?),
                None => parser,
            }
        };
        let index_builder = DatasetIndexBuilder::new().verify_pairing(config.verify_pairing);
        let (images_dir, labels_dir) = dataset.split_dirs(split);

        info!("loading {} split from '{}'", split, dataset.root.display());
        Self::load(
            images_dir,
            labels_dir,
            parser,
            index_builder,
            config.num_workers(),
        )
        .await
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty()
    }

    /// The total number of boxes over all records.
    pub fn num_boxes(&self) -> usize {
        self.boxes.num_values()
    }

    pub fn get(&self, index: usize) -> Option<RecordRef<'_>> {
        Some(RecordRef {
            index,
            image_path: self.image_paths.get(index)?,
            size: self.sizes.get(index)?,
            classes: self.classes.get(index)?,
            boxes: self.boxes.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordRef<'_>> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Copy a contiguous range of records into a new store.
    pub fn range(&self, range: Range<usize>) -> Option<Self> {
        Some(Self {
            image_paths: self.image_paths.get(range.clone())?.to_vec(),
            sizes: self.sizes.get(range.clone())?.to_vec(),
            classes: self.classes.slice(range.clone())?,
            boxes: self.boxes.slice(range)?,
        })
    }

    /// Copy the listed records, in order, into a new store.
    pub fn select(&self, indexes: &[usize]) -> Option<Self> {
        let image_paths = indexes
            .iter()
            .map(|&index| self.image_paths.get(index).cloned())
            .collect::<Option<_>>()?;
        let sizes = indexes
            .iter()
            .map(|&index| self.sizes.get(index).copied())
            .collect::<Option<_>>()?;

        Some(Self {
            image_paths,
            sizes,
            classes: self.classes.gather(indexes)?,
            boxes: self.boxes.gather(indexes)?,
        })
    }

    pub fn image_paths(&self) -> &[PathBuf] {
        &self.image_paths
    }

    pub fn classes(&self) -> &Ragged<u32> {
        &self.classes
    }

    pub fn boxes(&self) -> &Ragged<Corners<f32>> {
        &self.boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<AnnotationRecord> {
        let boxes = [
            Corners::from_xyxy([0.0, 0.0, 10.0, 10.0]),
            Corners::from_xyxy([5.0, 5.0, 20.0, 30.0]),
        ];
        vec![
            AnnotationRecord::new("a.jpg", HW::from_hw([32, 32]), vec![0, 1], boxes.to_vec())
                .unwrap(),
            AnnotationRecord::new("b.jpg", HW::from_hw([32, 48]), vec![], vec![]).unwrap(),
            AnnotationRecord::new("c.jpg", HW::from_hw([64, 32]), vec![2], boxes[..1].to_vec())
                .unwrap(),
        ]
    }

    #[test]
    fn store_aligned_rows() {
        let records = sample_records();
        let store = RecordStore::from_records(records.clone());

        assert_eq!(store.len(), 3);
        assert_eq!(store.num_boxes(), 3);
        assert_eq!(store.image_paths().len(), store.classes().len());
        assert_eq!(store.classes().len(), store.boxes().len());

        for (record, expect) in store.iter().zip(&records) {
            assert_eq!(record.classes.len(), record.boxes.len());
            assert_eq!(&record.to_record(), expect);
        }

        let empty = store.get(1).unwrap();
        assert!(empty.classes.is_empty());
        assert!(empty.boxes.is_empty());
        assert!(store.get(3).is_none());
    }

    #[test]
    fn store_range_and_select() {
        let records = sample_records();
        let store = RecordStore::from_records(records.clone());

        let tail = store.range(1..3).unwrap();
        assert_eq!(tail, RecordStore::from_records(records[1..].to_vec()));
        assert!(store.range(2..4).is_none());

        let picked = store.select(&[2, 0]).unwrap();
        assert_eq!(
            picked,
            RecordStore::from_records(vec![records[2].clone(), records[0].clone()])
        );
        assert!(store.select(&[5]).is_none());
    }
}
