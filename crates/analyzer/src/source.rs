use image::RgbImage;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_LOAD_MAX_DIMENSION: u32 = 224;

#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image loading task failed: {0}")]
    Task(String),
}

/// Decodes images from disk off the async runtime.
///
/// With a bound set, the image is scaled (keeping its aspect ratio) so its
/// shorter side equals the bound and the longer side overflows it, the way a
/// center-outside image loader sizes a picked picture for a square target.
#[derive(Debug, Clone, Copy)]
pub struct FileImageSource {
    max_dimension: Option<u32>,
}

impl FileImageSource {
    pub fn new(max_dimension: Option<u32>) -> Self {
        Self { max_dimension }
    }

    pub fn max_dimension(&self) -> Option<u32> {
        self.max_dimension
    }

    pub async fn load(&self, path: &Path) -> Result<RgbImage, ImageLoadError> {
        let path = path.to_path_buf();
        let max_dimension = self.max_dimension;

        tokio::task::spawn_blocking(move || decode(&path, max_dimension))
            .await
            .map_err(|e| ImageLoadError::Task(e.to_string()))?
    }
}

impl Default for FileImageSource {
    fn default() -> Self {
        Self::new(Some(DEFAULT_LOAD_MAX_DIMENSION))
    }
}

fn decode(path: &Path, max_dimension: Option<u32>) -> Result<RgbImage, ImageLoadError> {
    if !path.is_file() {
        return Err(ImageLoadError::NotFound(path.to_path_buf()));
    }

    let image = image::open(path)?;
    let image = match max_dimension.map(|max| center_outside(image.width(), image.height(), max)) {
        Some((width, height)) if (width, height) != (image.width(), image.height()) => {
            image.resize_exact(width, height, FilterType::Triangle)
        }
        _ => image,
    };

    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Image decoded"
    );
    Ok(image.to_rgb8())
}

/// Dimensions that make the shorter side exactly `target`.
fn center_outside(width: u32, height: u32, target: u32) -> (u32, u32) {
    let shorter = width.min(height);
    if shorter == 0 || target == 0 {
        return (width, height);
    }
    let scale = f64::from(target) / f64::from(shorter);
    let fit = |side: u32| {
        if side == shorter {
            target
        } else {
            ((f64::from(side) * scale).round() as u32).max(target)
        }
    };
    (fit(width), fit(height))
}
