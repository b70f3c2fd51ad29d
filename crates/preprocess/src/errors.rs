use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Invalid image: {width}x{height} has no pixels")]
    InvalidImage { width: u32, height: u32 },

    #[error("Region {width}x{height} at ({left}, {top}) exceeds {source_width}x{source_height} source")]
    RegionOutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    #[error("Cannot encode an empty region")]
    EmptyRegion,

    #[error("Resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Image buffer error: {0}")]
    ImageBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl PreprocessError {
    /// Whether this failure happened while building the network tensor, as
    /// opposed to while validating the source image.
    pub fn is_encoding(&self) -> bool {
        !matches!(
            self,
            PreprocessError::InvalidImage { .. } | PreprocessError::RegionOutOfBounds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = PreprocessError::InvalidImage {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Invalid image: 0x12 has no pixels");

        let err = PreprocessError::RegionOutOfBounds {
            left: 5,
            top: 0,
            width: 10,
            height: 4,
            source_width: 8,
            source_height: 4,
        };
        assert_eq!(
            err.to_string(),
            "Region 10x4 at (5, 0) exceeds 8x4 source"
        );

        assert_eq!(
            PreprocessError::EmptyRegion.to_string(),
            "Cannot encode an empty region"
        );
    }

    #[test]
    fn test_encoding_classification() {
        assert!(PreprocessError::EmptyRegion.is_encoding());
        assert!(
            !PreprocessError::InvalidImage {
                width: 0,
                height: 0
            }
            .is_encoding()
        );
    }
}
