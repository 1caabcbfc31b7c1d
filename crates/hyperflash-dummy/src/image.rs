//! Image file persistence for the dummy chip
//!
//! An image holds the raw contents of the whole physical array, so the
//! reserved region in front of the block device is part of it.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::{DummyConfig, DummyHyperFlash};

/// Errors from loading or saving an image
#[derive(Debug, Error)]
pub enum ImageError {
    /// Reading or writing the image file failed
    #[error("failed to access image {path}: {source}")]
    Io {
        /// Path of the image file
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Image size does not match the emulated chip
    #[error("image {path} is {found} bytes, expected {expected}")]
    SizeMismatch {
        /// Path of the image file
        path: String,
        /// Chip size in bytes
        expected: usize,
        /// Image size in bytes
        found: usize,
    },
}

impl DummyHyperFlash {
    /// Load a chip from an image file, or create an erased one if the file
    /// does not exist yet
    pub fn open_image(path: impl AsRef<Path>, config: DummyConfig) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("{} does not exist, starting from an erased chip", path.display());
                return Ok(Self::new(config));
            }
            Err(source) => {
                return Err(ImageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        if data.len() != config.size {
            return Err(ImageError::SizeMismatch {
                path: path.display().to_string(),
                expected: config.size,
                found: data.len(),
            });
        }

        log::debug!("loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::with_data(config, &data))
    }

    /// Write the chip contents to an image file
    pub fn save_image(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let path = path.as_ref();
        fs::write(path, self.data()).map_err(|source| ImageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("saved {} bytes to {}", self.data().len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_image(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "hyperflash-dummy-{}-{}.bin",
            name,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    fn config() -> DummyConfig {
        DummyConfig {
            size: 512 * 1024,
            ..DummyConfig::default()
        }
    }

    #[test]
    fn test_missing_image_is_erased() {
        let path = temp_image("missing");
        let flash = DummyHyperFlash::open_image(&path, config()).unwrap();
        assert!(flash.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_image("reload");
        let mut flash = DummyHyperFlash::new(config());
        flash.data_mut()[0x100..0x104].copy_from_slice(&[1, 2, 3, 4]);
        flash.save_image(&path).unwrap();

        let reloaded = DummyHyperFlash::open_image(&path, config()).unwrap();
        assert_eq!(reloaded.data(), flash.data());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_size_mismatch() {
        let path = temp_image("mismatch");
        fs::write(&path, [0u8; 16]).unwrap();

        let err = DummyHyperFlash::open_image(&path, config()).err().unwrap();
        assert!(matches!(
            err,
            ImageError::SizeMismatch {
                expected: 524288,
                found: 16,
                ..
            }
        ));

        fs::remove_file(&path).unwrap();
    }
}
