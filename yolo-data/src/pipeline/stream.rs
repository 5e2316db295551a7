use super::{Batch, ShuffleBuffer};
use crate::{
    common::*,
    config::PipelineConfig,
    dataset::{RecordStore, Sample},
    processor::{ImageBackend, ImageRsBackend, JitteredResize, JitteredResizeInit, SampleLoader},
    profiling::Timing,
};
use tokio::{sync::mpsc, task::JoinHandle};

/// The mixing constant that separates the random streams of consecutive epochs.
const EPOCH_SEED_MIXER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Turns a record store into a sequence of augmented batches.
///
/// Every call to [stream](BatchPipeline::stream) starts a fresh pass over the store. A pass
/// draws samples in store order, or through a windowed shuffle buffer, groups them into
/// batches of exactly `batch_size` samples and drops the trailing remainder. Sample loading
/// and augmentation run on a bounded worker pool, and finished batches are prefetched into a
/// bounded queue.
///
/// Each pass derives its random streams from the configured seed and the pass number, and
/// each sample owns a generator seeded from that stream. The output of a pass is thus
/// independent of worker scheduling.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct BatchPipeline {
    store: Arc<RecordStore>,
    config: Arc<PipelineConfig>,
    loader: SampleLoader,
    augmentor: JitteredResize,
    #[derivative(Debug = "ignore")]
    next_epoch: AtomicUsize,
}

impl BatchPipeline {
    /// Build a pipeline over a store with the default `image` backend.
    pub fn construct(store: impl Into<Arc<RecordStore>>, config: PipelineConfig) -> Result<Self> {
        Self::with_backend(store, config, Arc::new(ImageRsBackend))
    }

    /// Build a pipeline that decodes and resizes images with a custom backend.
    pub fn with_backend(
        store: impl Into<Arc<RecordStore>>,
        config: PipelineConfig,
        backend: Arc<dyn ImageBackend>,
    ) -> Result<Self> {
        config.validate()?;
        let store = store.into();

        let augmentor = JitteredResizeInit {
            target_size: config.target_hw(),
            scale_range: config.augment.then(|| config.scale_jitter_range),
            fill_value: config.fill_value,
        }
        .build()?
        .with_backend(backend.clone());
        let loader = SampleLoader::new(backend);

        let pipeline = Self {
            store,
            config: Arc::new(config),
            loader,
            augmentor,
            next_epoch: AtomicUsize::new(0),
        };

        info!(
            "constructed pipeline over {} samples, {} batches of {} per pass, {} workers",
            pipeline.store.len(),
            pipeline.num_batches(),
            pipeline.config.batch_size,
            pipeline.config.num_workers()
        );
        if pipeline.num_batches() == 0 {
            warn!(
                "the store has {} samples, fewer than a batch of {}",
                pipeline.store.len(),
                pipeline.config.batch_size
            );
        }

        Ok(pipeline)
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The number of batches in every pass.
    pub fn num_batches(&self) -> usize {
        self.store.len() / self.config.batch_size.get()
    }

    /// Start the next pass.
    ///
    /// Passes are numbered from zero in the order this method is called. It must be called
    /// within a tokio runtime.
    pub fn stream(&self) -> Result<BatchStream> {
        let epoch = self.next_epoch.fetch_add(1, atomic::Ordering::SeqCst);
        self.stream_epoch(epoch)
    }

    /// Start the pass numbered `epoch`.
    ///
    /// The same epoch always yields the same batches. It must be called within a tokio
    /// runtime.
    pub fn stream_epoch(&self, epoch: usize) -> Result<BatchStream> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| Error::Worker(format!("no tokio runtime is available: {}", err)))?;

        let plan = self.plan(epoch);
        let num_batches = plan.len() / self.config.batch_size.get();
        let batch_size = self.config.batch_size.get();
        let num_workers = self.config.num_workers().max(1);
        let (tx, rx) = mpsc::channel(self.config.prefetch_batches);

        let store = self.store.clone();
        let loader = self.loader.clone();
        let augmentor = self.augmentor.clone();

        let producer = async move {
            // load and augment samples
            let samples = stream::iter(plan).par_map(num_workers, move |(index, seed)| {
                let store = store.clone();
                let loader = loader.clone();
                let augmentor = augmentor.clone();

                move || load_sample(&store, &loader, &augmentor, index, seed)
            });

            // group into batches
            let batches = samples
                .chunks(batch_size)
                .enumerate()
                .map(move |(index, results)| {
                    let samples: Vec<_> = results.into_iter().collect::<Result<_>>()?;
                    Batch::from_samples(epoch, index, samples)
                });
            futures::pin_mut!(batches);

            while let Some(result) = batches.next().await {
                let is_err = result.is_err();
                match &result {
                    Ok(batch) => debug!("produced batch {} of epoch {}", batch.index, epoch),
                    Err(err) => warn!("stop epoch {} on error: {}", epoch, err),
                }

                // the consumer is gone
                if tx.send(result).await.is_err() {
                    break;
                }
                if is_err {
                    break;
                }
            }
        };
        let handle = runtime.spawn(producer);

        Ok(BatchStream {
            rx,
            handle: Some(handle),
            num_batches,
        })
    }

    /// The sample indexes and per-sample seeds of a pass, truncated to whole batches.
    fn plan(&self, epoch: usize) -> Vec<(usize, u64)> {
        let PipelineConfig {
            seed,
            shuffle,
            shuffle_buffer_size,
            ..
        } = *self.config;

        let mut rng = StdRng::seed_from_u64(seed ^ (epoch as u64).wrapping_mul(EPOCH_SEED_MIXER));
        let num_samples = self.num_batches() * self.config.batch_size.get();

        let order: Vec<usize> = if shuffle {
            let buffer_rng = StdRng::seed_from_u64(rng.gen());
            ShuffleBuffer::new(0..self.store.len(), shuffle_buffer_size, buffer_rng)
                .take(num_samples)
                .collect()
        } else {
            (0..num_samples).collect()
        };

        order.into_iter().map(|index| (index, rng.gen())).collect()
    }
}

fn load_sample(
    store: &RecordStore,
    loader: &SampleLoader,
    augmentor: &JitteredResize,
    index: usize,
    seed: u64,
) -> Result<Sample> {
    let mut timing = Timing::new("load_sample");

    let record = store
        .get(index)
        .ok_or_else(|| Error::Worker(format!("sample index {} is out of range", index)))?;
    let sample = loader.load_sample(&record)?;
    timing.set_record("decode");

    let mut rng = StdRng::seed_from_u64(seed);
    let sample = augmentor.forward_sample(&sample, &mut rng)?;
    timing.set_record("augment");

    timing.report();
    Ok(sample)
}

/// The batches of one pass, prefetched by a background task.
///
/// The stream ends after the last batch or right after the first error. Dropping it aborts
/// the background task.
#[derive(Debug)]
pub struct BatchStream {
    rx: mpsc::Receiver<Result<Batch>>,
    handle: Option<JoinHandle<()>>,
    num_batches: usize,
}

impl BatchStream {
    /// The number of batches the pass yields if no error occurs.
    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    /// Consume the stream from synchronous code.
    ///
    /// The stream must be created on a multi-threaded runtime that stays alive during
    /// iteration, and the iterator must not be driven from within an async task.
    pub fn into_blocking(self) -> BlockingBatchIter {
        BlockingBatchIter { stream: self }
    }
}

impl Stream for BatchStream {
    type Item = Result<Batch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(item) = futures::ready!(self.rx.poll_recv(cx)) {
            return Poll::Ready(Some(item));
        }

        // the channel is closed, check how the producer ended
        let handle = match self.handle.as_mut() {
            Some(handle) => handle,
            None => return Poll::Ready(None),
        };
        let result = futures::ready!(handle.poll_unpin(cx));
        self.handle = None;

        match result {
            Ok(()) => Poll::Ready(None),
            Err(err) => Poll::Ready(Some(Err(Error::Worker(err.to_string())))),
        }
    }
}

impl Drop for BatchStream {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

/// The blocking iterator created by [BatchStream::into_blocking].
#[derive(Debug)]
pub struct BlockingBatchIter {
    stream: BatchStream,
}

impl Iterator for BlockingBatchIter {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        futures::executor::block_on(self.stream.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(len: usize, batch_size: usize, shuffle: bool) -> BatchPipeline {
        let records = (0..len).map(|index| {
            crate::dataset::AnnotationRecord::new(
                format!("{}.jpg", index),
                HW::from_hw([8, 8]),
                vec![],
                vec![],
            )
            .unwrap()
        });
        let config = PipelineConfig {
            shuffle,
            shuffle_buffer_size: NonZeroUsize::new(4).unwrap(),
            seed: 3,
            ..PipelineConfig::new([8, 8], NonZeroUsize::new(batch_size).unwrap())
        };
        BatchPipeline::construct(RecordStore::from_records(records), config).unwrap()
    }

    #[test]
    fn plan_drops_remainder() {
        let pipeline = pipeline(5, 2, false);
        assert_eq!(pipeline.num_batches(), 2);

        let indexes: Vec<_> = pipeline.plan(0).into_iter().map(|(index, _)| index).collect();
        assert_eq!(indexes, [0, 1, 2, 3]);
    }

    #[test]
    fn plan_is_reproducible_per_epoch() {
        let pipeline = pipeline(20, 4, true);
        assert_eq!(pipeline.plan(0), pipeline.plan(0));
        assert_ne!(pipeline.plan(0), pipeline.plan(1));

        let mut indexes: Vec<_> = pipeline.plan(1).into_iter().map(|(index, _)| index).collect();
        indexes.sort_unstable();
        indexes.dedup();
        assert_eq!(indexes.len(), 20);
    }

    #[test]
    fn stream_requires_runtime() {
        let pipeline = pipeline(4, 2, false);
        assert!(matches!(pipeline.stream(), Err(Error::Worker(_))));
    }
}
