use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{info, warn};
use std::{fs, io, path::PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const RECIPE_IMAGES: &str = "recipes/images";
pub const MEDIA_URL: &str = "/media";

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image must be a base64 encoded data URI like data:image/png;base64,...")]
    NotDataUri,
    #[error("unsupported image type {0:?}")]
    UnsupportedType(String),
    #[error("image payload is not valid base64")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("image could not be stored")]
    Storage(#[from] io::Error),
}

#[derive(Debug, PartialEq)]
pub struct DataUri {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decodes `data:image/<type>;base64,<payload>`.
pub fn parse_data_uri(value: &str) -> Result<DataUri, ImageError> {
    let rest = value
        .strip_prefix("data:image/")
        .ok_or(ImageError::NotDataUri)?;
    let (media_type, payload) = rest.split_once(";base64,").ok_or(ImageError::NotDataUri)?;
    // svg+xml is stored as .svg
    let extension = media_type.split('+').next().unwrap_or_default();
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ImageError::UnsupportedType(media_type.to_string()));
    }
    let bytes = STANDARD.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(ImageError::NotDataUri);
    }
    Ok(DataUri {
        extension: extension.to_ascii_lowercase(),
        bytes,
    })
}

/// Recipe images on disk under `root`, served at [`MEDIA_URL`].
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MediaStore { root: root.into() }
    }

    /// Writes the image and returns its public url.
    pub fn save_recipe_image(&self, image: &DataUri) -> Result<String, ImageError> {
        let dir = self.root.join(RECIPE_IMAGES);
        fs::create_dir_all(&dir)?;
        let file = format!("{}.{}", Uuid::new_v4(), image.extension);
        fs::write(dir.join(&file), &image.bytes)?;
        info!("stored recipe image {file} ({} bytes)", image.bytes.len());
        Ok(format!("{MEDIA_URL}/{RECIPE_IMAGES}/{file}"))
    }

    /// Removes a previously stored image. Failures are logged and ignored.
    pub fn remove(&self, url: &str) {
        let relative = match url.strip_prefix(MEDIA_URL).map(|r| r.trim_start_matches('/')) {
            Some(relative) if relative.starts_with(RECIPE_IMAGES) && !relative.contains("..") => {
                relative
            }
            _ => {
                warn!("refusing to remove media outside {RECIPE_IMAGES}: {url}");
                return;
            }
        };
        if let Err(e) = fs::remove_file(self.root.join(relative)) {
            warn!("failed to remove {url}: {e}");
        }
    }
}
