use crate::errors::PreprocessError;
use image::RgbImage;

/// Axis-aligned rectangle in the coordinate space of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Check that the region lies inside a `source_width` x `source_height` image.
    pub fn within(&self, source_width: u32, source_height: u32) -> Result<(), PreprocessError> {
        let right = self.left as u64 + self.width as u64;
        let bottom = self.top as u64 + self.height as u64;

        if right > source_width as u64 || bottom > source_height as u64 {
            return Err(PreprocessError::RegionOutOfBounds {
                left: self.left,
                top: self.top,
                width: self.width,
                height: self.height,
                source_width,
                source_height,
            });
        }

        Ok(())
    }

    /// Copy the region out of `source` into a new image. The source is left untouched.
    pub fn crop(&self, source: &RgbImage) -> Result<RgbImage, PreprocessError> {
        self.within(source.width(), source.height())?;
        Ok(image::imageops::crop_imm(source, self.left, self.top, self.width, self.height).to_image())
    }
}

/// The two disjoint regions an analysis request works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPair {
    /// Fed to the custom model.
    pub main: Region,
    /// Fed to the general-purpose labeler.
    pub other: Region,
}

/// Splits an image vertically into a left (`main`) and right (`other`) region.
///
/// The left width is `floor(width * split_ratio)`; the right region takes the
/// remaining columns, so an odd width gives the extra column to the right.
#[derive(Debug, Clone, Copy)]
pub struct RegionPartitioner {
    split_ratio: f64,
}

impl RegionPartitioner {
    pub const DEFAULT_SPLIT_RATIO: f64 = 0.5;

    pub fn new(split_ratio: f64) -> Self {
        let split_ratio = if split_ratio.is_finite() {
            split_ratio.clamp(0.0, 1.0)
        } else {
            Self::DEFAULT_SPLIT_RATIO
        };
        Self { split_ratio }
    }

    pub fn split_ratio(&self) -> f64 {
        self.split_ratio
    }

    pub fn partition(&self, image: &RgbImage) -> Result<RegionPair, PreprocessError> {
        self.partition_dims(image.width(), image.height())
    }

    pub fn partition_dims(&self, width: u32, height: u32) -> Result<RegionPair, PreprocessError> {
        if width == 0 || height == 0 {
            return Err(PreprocessError::InvalidImage { width, height });
        }

        let main_width = ((width as f64) * self.split_ratio).floor() as u32;
        let main_width = main_width.min(width);

        let pair = RegionPair {
            main: Region::new(0, 0, main_width, height),
            other: Region::new(main_width, 0, width - main_width, height),
        };

        tracing::trace!(
            width,
            height,
            main_width = pair.main.width,
            other_width = pair.other.width,
            "Partitioned image"
        );

        Ok(pair)
    }
}

impl Default for RegionPartitioner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPLIT_RATIO)
    }
}
