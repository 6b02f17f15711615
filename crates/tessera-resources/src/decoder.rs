//! Turning a path on disk into RGBA8 pixels.

use std::path::{Path, PathBuf};

use crate::texture::DecodedImage;

/// Reasons an atlas image could not be turned into pixels.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Missing file, unsupported format, corrupt data.
    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The file decoded but has no pixels.
    #[error("image {path} has zero width or height")]
    Empty { path: PathBuf },
}

/// Reads and decodes one image. Runs on the loader thread.
pub trait ImageDecoder: Send {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// Decodes PNG/JPEG files with the `image` crate, always producing RGBA8.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let rgba = image::open(path)
            .map_err(|source| DecodeError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(DecodedImage {
            width,
            height,
            channels: 4,
            pixels: rgba.into_raw(),
        })
    }
}
