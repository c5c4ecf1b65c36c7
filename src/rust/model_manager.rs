use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};
use serde::{Deserialize, Serialize};

pub const MODEL_FILE: &str = "model.onnx";
pub const SCHEMA_FILE: &str = "feature_names.json";
pub const LABELS_FILE: &str = "labels.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Where to fetch one set of scoring artifacts and the SHA-256 each file must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub model_url: String,
    pub model_hash: String,
    pub schema_url: String,
    pub schema_hash: String,
    /// Class labels are optional; classifiers without them fall back to
    /// positional column resolution.
    #[serde(default)]
    pub labels_url: Option<String>,
    #[serde(default)]
    pub labels_hash: Option<String>,
}

/// Resolved on-disk locations of an artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub schema: PathBuf,
    pub labels: PathBuf,
}

#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("PHISHSHIELD_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("phishshield").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("phishshield").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("phishshield").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(MODEL_FILE)
    }

    pub fn get_schema_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(SCHEMA_FILE)
    }

    pub fn get_labels_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(LABELS_FILE)
    }

    pub fn artifact_paths(&self, name: &str) -> ArtifactPaths {
        ArtifactPaths {
            model: self.get_model_path(name),
            schema: self.get_schema_path(name),
            labels: self.get_labels_path(name),
        }
    }

    /// True when the model and its feature schema are on disk.
    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        let schema_path = self.get_schema_path(name);
        log::debug!("Checking if artifacts '{}' are downloaded:", name);
        log::debug!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("  Schema path: {:?} (exists: {})", schema_path, schema_path.exists());
        model_path.exists() && schema_path.exists()
    }

    /// Paths of an artifact set that is already on disk.
    pub fn downloaded_paths(&self, name: &str) -> Result<ArtifactPaths, ModelError> {
        if !self.is_model_downloaded(name) {
            return Err(ModelError::NotDownloaded(name.to_string()));
        }
        Ok(self.artifact_paths(name))
    }

    pub async fn download_model(&self, info: &ArtifactInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let mut files = vec![
            (info.model_url.as_str(), self.get_model_path(&info.name), info.model_hash.as_str(), "model"),
            (info.schema_url.as_str(), self.get_schema_path(&info.name), info.schema_hash.as_str(), "schema"),
        ];
        if let (Some(url), Some(hash)) = (&info.labels_url, &info.labels_hash) {
            files.push((url.as_str(), self.get_labels_path(&info.name), hash.as_str(), "labels"));
        }

        for (url, path, hash, file_type) in files {
            let result = if path.exists() && self.verify_file(&path, hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                Ok(())
            } else {
                log::info!("Fetching {} file...", file_type);
                self.download_and_verify_file(url, &path, hash, file_type).await
            };

            if let Err(e) = result {
                log::error!("Failed to setup {} file: {}", file_type, e);
                // Cleanup on failure
                let _ = self.remove_download(&info.name);
                return Err(e);
            }
        }

        log::info!("Artifacts '{}' ready to use", info.name);
        Ok(())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        log::debug!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    pub fn verify_model(&self, info: &ArtifactInfo) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(&info.name);
        let schema_path = self.get_schema_path(&info.name);

        if !model_path.exists() || !schema_path.exists() {
            log::info!("Model or schema file does not exist");
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, &info.model_hash)?;
        let schema_ok = self.verify_file(&schema_path, &info.schema_hash)?;
        let labels_ok = match &info.labels_hash {
            Some(hash) => {
                let labels_path = self.get_labels_path(&info.name);
                labels_path.exists() && self.verify_file(&labels_path, hash)?
            }
            None => true,
        };

        log::info!("Verification results:");
        log::info!("  Model hash verification: {}", model_ok);
        log::info!("  Schema hash verification: {}", schema_ok);
        log::info!("  Labels hash verification: {}", labels_ok);

        Ok(model_ok && schema_ok && labels_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        if !hash.eq_ignore_ascii_case(expected_hash) {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected_hash, hash);
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        for path in [
            self.get_model_path(name),
            self.get_schema_path(name),
            self.get_labels_path(name),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that an artifact set is downloaded and verified.
    /// If the files don't exist, they will be downloaded.
    /// If verification fails, they will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ArtifactInfo) -> Result<(), ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Artifacts '{}' not found, downloading...", info.name);
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Artifact verification failed, re-downloading...");
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        } else {
            log::info!("Artifact verification successful");
        }
        Ok(())
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        // Test with environment variable
        env::set_var("PHISHSHIELD_CACHE", "/tmp/test-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-cache/models"));
        env::remove_var("PHISHSHIELD_CACHE");

        // Test without environment variable
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("phishshield"));
    }

    #[test]
    fn test_artifact_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let paths = manager.artifact_paths("urlnet");
        assert!(paths.model.ends_with("urlnet/model.onnx"));
        assert!(paths.schema.ends_with("urlnet/feature_names.json"));
        assert!(paths.labels.ends_with("urlnet/labels.json"));
        assert!(!manager.is_model_downloaded("urlnet"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_local_files() -> Result<(), ModelError> {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path())?;
        let info = ArtifactInfo {
            name: "local".to_string(),
            model_url: String::new(),
            model_hash: sha256_hex(b"model-bytes"),
            schema_url: String::new(),
            schema_hash: sha256_hex(b"[\"url_length\"]"),
            labels_url: None,
            labels_hash: None,
        };

        assert!(!manager.verify_model(&info)?);

        fs::create_dir_all(dir.path().join("local"))?;
        fs::write(manager.get_model_path("local"), b"model-bytes")?;
        fs::write(manager.get_schema_path("local"), b"[\"url_length\"]")?;
        assert!(manager.is_model_downloaded("local"));
        assert!(manager.verify_model(&info)?);

        fs::write(manager.get_model_path("local"), b"corrupted data")?;
        assert!(!manager.verify_model(&info)?);

        assert_eq!(manager.downloaded_paths("local")?, manager.artifact_paths("local"));

        manager.remove_download("local")?;
        assert!(!manager.is_model_downloaded("local"));
        assert!(matches!(
            manager.downloaded_paths("local"),
            Err(ModelError::NotDownloaded(name)) if name == "local"
        ));
        Ok(())
    }
}
