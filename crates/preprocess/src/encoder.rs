use crate::errors::PreprocessError;
use common::{span, span_debug};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, IxDyn};

pub const DEFAULT_INPUT_SIZE: u32 = 224;
const CHANNELS: usize = 3;

/// Turns an RGB region into the `[1, size, size, 3]` float tensor the
/// classifiers consume.
///
/// The region is stretched to `size` x `size` with a bilinear filter (no crop,
/// no letterbox), then every channel is scaled to `[0, 1]`. Values are laid
/// out row-major with R, G, B interleaved per pixel.
pub struct TensorEncoder {
    size: u32,
    resizer: Resizer,
    rgb_buffer: Vec<u8>,
    resized: Image<'static>,
}

impl TensorEncoder {
    pub fn new(size: u32) -> Self {
        let size = size.max(1);
        Self {
            size,
            resizer: Resizer::new(),
            rgb_buffer: Vec::with_capacity(1024 * 1024 * CHANNELS),
            resized: Image::new(size, size, PixelType::U8x3),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of f32 values in every tensor this encoder produces.
    pub fn tensor_len(&self) -> usize {
        self.size as usize * self.size as usize * CHANNELS
    }

    pub fn encode(&mut self, region: &RgbImage) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span_debug!("encode_region");

        let (width, height) = region.dimensions();
        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyRegion);
        }

        tracing::trace!(width, height, target = self.size, "Encoding region");

        self.copy_rgb_pixels(region);
        self.resize(width, height)?;
        self.normalize()
    }

    fn copy_rgb_pixels(&mut self, region: &RgbImage) {
        self.rgb_buffer.clear();
        self.rgb_buffer.extend_from_slice(region.as_raw());
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), PreprocessError> {
        let _s = span!("resize_region");

        let src = Image::from_slice_u8(width, height, &mut self.rgb_buffer, PixelType::U8x3)?;

        self.resizer.resize(
            &src,
            &mut self.resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        Ok(())
    }

    fn normalize(&self) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("normalize");

        let side = self.size as usize;
        let mut output = Vec::with_capacity(self.tensor_len());

        for px in self.resized.buffer().chunks_exact(CHANNELS) {
            output.push(px[0] as f32 / 255.0);
            output.push(px[1] as f32 / 255.0);
            output.push(px[2] as f32 / 255.0);
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, side, side, CHANNELS]),
            output,
        )?)
    }
}

impl Default for TensorEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

/// View a standard-layout tensor as bytes in the platform's native order,
/// ready to hand to a native inference call.
pub fn as_native_bytes(tensor: &Array<f32, IxDyn>) -> Option<&[u8]> {
    tensor.as_slice().map(bytemuck::cast_slice)
}
