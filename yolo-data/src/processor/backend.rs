use crate::common::*;
use image::{imageops::FilterType, ImageBuffer, Rgb};

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// The image decoding and resizing capability used by the pipeline.
///
/// Images are `[height, width, 3]` arrays of raw intensities.
pub trait ImageBackend
where
    Self: Debug + Send + Sync,
{
    /// Decode an encoded image file into an RGB array.
    fn decode(&self, bytes: &[u8]) -> Result<Array3<f32>, BackendError>;

    /// Resize an RGB array to `size` with bilinear interpolation.
    fn resize(&self, image: ArrayView3<'_, f32>, size: &HW<usize>)
        -> Result<Array3<f32>, BackendError>;
}

/// The [ImageBackend] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRsBackend;

impl ImageBackend for ImageRsBackend {
    fn decode(&self, bytes: &[u8]) -> Result<Array3<f32>, BackendError> {
        let image = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = image.dimensions();
        let values: Vec<f32> = image.into_raw().into_iter().map(f32::from).collect();
        let array = Array3::from_shape_vec((height as usize, width as usize, 3), values)?;
        Ok(array)
    }

    fn resize(
        &self,
        image: ArrayView3<'_, f32>,
        size: &HW<usize>,
    ) -> Result<Array3<f32>, BackendError> {
        let (height, width, channels) = image.dim();
        if channels != 3 {
            return Err(format!("expect 3 channels, but get {}", channels).into());
        }
        if size.h() == 0 || size.w() == 0 {
            return Err(format!("cannot resize to empty size {:?}", size.hw()).into());
        }
        if [height, width] == size.hw() {
            return Ok(image.to_owned());
        }

        let values: Vec<f32> = image.iter().cloned().collect();
        let buffer: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::from_raw(width as u32, height as u32, values)
                .ok_or("image buffer size mismatch")?;
        let resized = image::imageops::resize(
            &buffer,
            size.w() as u32,
            size.h() as u32,
            FilterType::Triangle,
        );
        let array = Array3::from_shape_vec((size.h(), size.w(), 3), resized.into_raw())?;
        Ok(array)
    }
}
