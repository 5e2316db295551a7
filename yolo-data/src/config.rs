//! Data pipeline configuration format.

use crate::common::*;

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load and validate a JSON5 configuration file.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = json5::from_str(&text).map_err(|err| {
            Error::Config(format!("failed to parse '{}': {}", path.display(), err))
        })?;
        config.pipeline.validate()?;
        Ok(config)
    }
}

/// Dataset location options.
///
/// A split named `train` is expected at `<root>/train/images` and `<root>/train/labels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub root: PathBuf,
    /// Optional newline-separated list of class names.
    #[serde(default)]
    pub class_names: Option<PathBuf>,
}

impl DatasetConfig {
    /// The image and label directories of a split.
    pub fn split_dirs(&self, split: Split) -> (PathBuf, PathBuf) {
        let dir = self.root.join(split.dir_name());
        (dir.join("images"), dir.join("labels"))
    }
}

/// The named partitions of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Batch pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The output image size in `[height, width]`.
    pub target_size: [usize; 2],
    /// The range of the random scaling factor.
    pub scale_jitter_range: (R64, R64),
    pub batch_size: NonZeroUsize,
    pub shuffle: bool,
    /// The number of samples in the windowed shuffle buffer.
    pub shuffle_buffer_size: NonZeroUsize,
    /// If unset, images are resized to the target size without random jitter.
    pub augment: bool,
    /// The number of loading workers, either `"auto"` or a positive integer.
    #[serde(default)]
    pub parallelism: Parallelism,
    pub seed: u64,
    /// The number of assembled batches waiting for the consumer.
    #[serde(default = "default_prefetch_batches")]
    pub prefetch_batches: usize,
    /// The intensity filling the padded area.
    #[serde(default)]
    pub fill_value: f32,
    /// If set, boxes are clipped to their image when annotations are parsed.
    #[serde(default)]
    pub clamp_boxes: bool,
    /// If set, image and label file stems must match pairwise.
    #[serde(default = "default_verify_pairing")]
    pub verify_pairing: bool,
}

impl PipelineConfig {
    /// A configuration with the given target size and batch size, no shuffling and no augmentation.
    pub fn new(target_size: [usize; 2], batch_size: NonZeroUsize) -> Self {
        Self {
            target_size,
            scale_jitter_range: (r64(0.8), r64(1.25)),
            batch_size,
            shuffle: false,
            shuffle_buffer_size: batch_size,
            augment: false,
            parallelism: Parallelism::Auto,
            seed: 0,
            prefetch_batches: default_prefetch_batches(),
            fill_value: 0.0,
            clamp_boxes: false,
            verify_pairing: default_verify_pairing(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let [target_h, target_w] = self.target_size;
        if target_h == 0 || target_w == 0 {
            return Err(Error::Config(format!(
                "target_size must be positive, but get {:?}",
                self.target_size
            )));
        }

        let (lo, hi) = self.scale_jitter_range;
        if lo <= 0.0 || hi <= 0.0 {
            return Err(Error::Config(
                "scale_jitter_range bounds must be positive".into(),
            ));
        }
        if lo > hi {
            return Err(Error::Config(
                "scale_jitter_range min must not exceed max".into(),
            ));
        }

        if let Parallelism::Fixed(0) = self.parallelism {
            return Err(Error::Config("parallelism must be positive".into()));
        }
        if self.prefetch_batches == 0 {
            return Err(Error::Config("prefetch_batches must be positive".into()));
        }
        if !self.fill_value.is_finite() {
            return Err(Error::Config("fill_value must be finite".into()));
        }

        Ok(())
    }

    pub fn target_hw(&self) -> HW<usize> {
        HW::from_hw(self.target_size)
    }

    pub fn num_workers(&self) -> usize {
        self.parallelism.num_workers()
    }
}

/// The size of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// Use the available hardware parallelism.
    Auto,
    Fixed(usize),
}

impl Parallelism {
    pub fn num_workers(&self) -> usize {
        match *self {
            Self::Auto => num_cpus::get(),
            Self::Fixed(num_workers) => num_workers,
        }
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::Auto
    }
}

impl Serialize for Parallelism {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Fixed(num_workers) => serializer.serialize_u64(num_workers as u64),
        }
    }
}

impl<'de> Deserialize<'de> for Parallelism {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as _;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Keyword(String),
            Count(usize),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Keyword(keyword) if keyword == "auto" => Ok(Self::Auto),
            Repr::Keyword(keyword) => Err(D::Error::custom(format!(
                "expect \"auto\" or a positive integer, but get \"{}\"",
                keyword
            ))),
            Repr::Count(num_workers) => Ok(Self::Fixed(num_workers)),
        }
    }
}

fn default_prefetch_batches() -> usize {
    2
}

fn default_verify_pairing() -> bool {
    true
}
