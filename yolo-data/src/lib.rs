//! The data pipeline that turns YOLO-format detection datasets into training batches.
//!
//! The flow is leaf-first:
//!
//! - [dataset::DatasetIndexBuilder] pairs image files with annotation files.
//! - [dataset::AnnotationParser] turns each pair into an [dataset::AnnotationRecord].
//! - [dataset::RecordStore] keeps the ragged records of a split in memory.
//! - [processor::SampleLoader] decodes images, [processor::JitteredResize] augments them
//!   together with their boxes.
//! - [pipeline::BatchPipeline] shuffles, loads, augments, batches and prefetches.

mod common;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod profiling;

pub use error::{Error, Result};
