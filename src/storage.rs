//! Naming and public URL policy for product photos kept in the media bucket.
//!
//! Uploading bytes is left to the bucket client; this module decides what an
//! object is called and where it can be fetched from.

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::ServiceError;

const UNIQUE_SUFFIX_LEN: usize = 7;

#[derive(Debug, Clone)]
pub struct MediaStorage {
    bucket_name: String,
    file_overwrite: bool,
    upload_to: String,
    base_url: Url,
}

impl MediaStorage {
    pub fn from_config(cfg: &StorageConfig) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&cfg.base_url).map_err(|e| {
            ServiceError::StorageError(format!("invalid storage base url {}: {}", cfg.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::StorageError(format!(
                "storage base url {} cannot hold object paths",
                cfg.base_url
            )));
        }
        if cfg.bucket_name.trim().is_empty() {
            return Err(ServiceError::StorageError(
                "storage bucket name is empty".to_string(),
            ));
        }

        debug!(
            bucket = cfg.bucket_name.trim(),
            acl = %cfg.default_acl,
            overwrite = cfg.file_overwrite,
            "Configured media storage"
        );

        Ok(Self {
            bucket_name: cfg.bucket_name.trim().to_string(),
            file_overwrite: cfg.file_overwrite,
            upload_to: cfg.upload_to.trim_matches('/').to_string(),
            base_url,
        })
    }

    /// Object name an upload of `filename` is stored under.
    ///
    /// Directory components of `filename` are dropped. With overwriting
    /// disabled the stem gets a random suffix so an existing object is
    /// never replaced.
    pub fn upload_name(&self, filename: &str) -> Result<String, ServiceError> {
        let base = filename
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .trim();
        if base.is_empty() || base == "." || base == ".." {
            return Err(ServiceError::InvalidInput(format!(
                "'{}' is not a usable file name",
                filename
            )));
        }

        let name = if self.file_overwrite {
            base.to_string()
        } else {
            let suffix: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(UNIQUE_SUFFIX_LEN)
                .collect();
            match base.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
                _ => format!("{}_{}", base, suffix),
            }
        };

        if self.upload_to.is_empty() {
            Ok(name)
        } else {
            Ok(format!("{}/{}", self.upload_to, name))
        }
    }

    /// Public URL for an object in the bucket.
    pub fn url(&self, name: &str) -> String {
        let name = name.trim();
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.bucket_name)
                .extend(name.split('/').filter(|s| !s.is_empty()));
        }
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(file_overwrite: bool) -> MediaStorage {
        MediaStorage::from_config(&StorageConfig {
            file_overwrite,
            ..StorageConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn uploads_get_unique_names_when_overwrite_is_disabled() {
        let storage = storage(false);
        let first = storage.upload_name("boot.jpg").unwrap();
        let second = storage.upload_name("boot.jpg").unwrap();

        assert!(first.starts_with("product_images/boot_"));
        assert!(first.ends_with(".jpg"));
        assert_eq!(first.len(), "product_images/boot_.jpg".len() + UNIQUE_SUFFIX_LEN);
        assert_ne!(first, second);
    }

    #[test]
    fn uploads_keep_name_when_overwrite_is_enabled() {
        let storage = storage(true);
        assert_eq!(
            storage.upload_name("../../etc/boot.jpg").unwrap(),
            "product_images/boot.jpg"
        );
        assert_eq!(
            storage.upload_name("C:\\photos\\boot.jpg").unwrap(),
            "product_images/boot.jpg"
        );
    }

    #[test]
    fn unusable_file_names_are_rejected() {
        let storage = storage(false);
        assert!(storage.upload_name("").is_err());
        assert!(storage.upload_name("photos/").is_err());
        assert!(storage.upload_name("..").is_err());
    }

    #[test]
    fn urls_point_into_the_bucket_and_escape_names() {
        let storage = storage(false);
        assert_eq!(
            storage.url("product_images/red boot.jpg"),
            "https://storage.googleapis.com/rene-shop/product_images/red%20boot.jpg"
        );
    }

    #[test]
    fn url_ignores_surrounding_whitespace() {
        let storage = storage(false);
        assert_eq!(
            storage.url("  product_images/boot.jpg \n"),
            "https://storage.googleapis.com/rene-shop/product_images/boot.jpg"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let cfg = StorageConfig {
            base_url: "mailto:media@example.com".to_string(),
            ..StorageConfig::default()
        };
        assert!(MediaStorage::from_config(&cfg).is_err());
    }
}
