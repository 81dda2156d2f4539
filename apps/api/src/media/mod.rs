//! Media Transfer Adapter — moves binary attachments (voice notes, images)
//! between the application and the object store, and converts between raw
//! bytes and the `data:` URI text encoding used at the AI boundary.
//!
//! Refs handed out by this module are full object URLs; callers treat them
//! as opaque and pass them back for deletion or retrieval.

use std::path::PathBuf;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use base64::Engine;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("unrecognized storage ref: {0}")]
    InvalidRef(String),

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("delete failed for {url}: {message}")]
    Delete { url: String, message: String },
}

/// Storage namespace for an attachment, one per attachment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    VoiceNotes,
    JournalImages,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::VoiceNotes => "voice-notes",
            MediaCategory::JournalImages => "journal-images",
        }
    }
}

/// The three shapes attachment content can arrive in. Dispatch is explicit
/// here rather than sniffed at call sites.
#[derive(Debug, Clone)]
pub enum MediaSource {
    Bytes { data: Vec<u8>, mime: String },
    File { path: PathBuf, mime: String },
    DataUri(String),
}

impl MediaSource {
    /// Resolves the source to raw bytes plus a MIME type.
    pub async fn into_parts(self) -> Result<(Vec<u8>, String), MediaError> {
        match self {
            MediaSource::Bytes { data, mime } => Ok((data, mime)),
            MediaSource::File { path, mime } => {
                let data = tokio::fs::read(&path)
                    .await
                    .map_err(|source| MediaError::FileRead { path, source })?;
                Ok((data, mime))
            }
            MediaSource::DataUri(uri) => decode_data_uri(&uri),
        }
    }
}

/// Splits a `data:<mime>;base64,<payload>` URI into its MIME type and the
/// still-encoded base64 payload.
pub fn split_data_uri(uri: &str) -> Result<(&str, &str), MediaError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| MediaError::InvalidDataUri(uri.chars().take(64).collect()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MediaError::InvalidDataUri(uri.chars().take(64).collect()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| MediaError::InvalidDataUri(uri.chars().take(64).collect()))?;
    Ok((mime, payload))
}

/// Decodes a base64 data URI into raw bytes plus its MIME type.
pub fn decode_data_uri(uri: &str) -> Result<(Vec<u8>, String), MediaError> {
    let (mime, payload) = split_data_uri(uri)?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| MediaError::InvalidDataUri(e.to_string()))?;
    Ok((data, mime.to_string()))
}

/// Re-encodes raw bytes as a base64 data URI embedding the MIME type.
pub fn encode_data_uri(mime: &str, data: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

/// Derives an object file name: caller-supplied name wins, otherwise a UUID
/// with an extension taken from the MIME subtype.
fn file_name_for(mime: &str, name: Option<String>) -> String {
    if let Some(name) = name {
        return name;
    }
    let ext = mime
        .rsplit('/')
        .next()
        .filter(|e| !e.is_empty())
        .unwrap_or("bin");
    format!("{}.{ext}", Uuid::new_v4())
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the content under the owner's namespace and returns a stable
    /// ref usable for later retrieval or deletion.
    async fn upload(
        &self,
        owner: Uuid,
        category: MediaCategory,
        source: MediaSource,
        name: Option<String>,
    ) -> Result<String, MediaError>;

    /// Deletes the referenced object. Deleting an already-absent object is
    /// success, not an error.
    async fn remove(&self, url: &str) -> Result<(), MediaError>;

    /// Retrieves the object's bytes re-encoded as a data URI for handoff to
    /// text-only consumers. Retrieval failures propagate.
    async fn fetch_as_data_uri(&self, url: &str) -> Result<String, MediaError>;
}

/// S3/MinIO-backed implementation. Keys are namespaced
/// `users/{owner}/{category}/{file}` and refs are path-style object URLs.
pub struct S3MediaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3MediaStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: String) -> Self {
        Self {
            client,
            bucket,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.endpoint, self.bucket)
    }

    fn key_from_url<'a>(&self, url: &'a str) -> Result<&'a str, MediaError> {
        let prefix = format!("{}/{}/", self.endpoint, self.bucket);
        url.strip_prefix(prefix.as_str())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| MediaError::InvalidRef(url.to_string()))
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        owner: Uuid,
        category: MediaCategory,
        source: MediaSource,
        name: Option<String>,
    ) -> Result<String, MediaError> {
        let (data, mime) = source.into_parts().await?;
        let file_name = file_name_for(&mime, name);
        let key = format!("users/{owner}/{}/{file_name}", category.as_str());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(mime)
            .send()
            .await
            .map_err(|e| MediaError::Upload {
                key: key.clone(),
                message: e.to_string(),
            })?;

        Ok(self.object_url(&key))
    }

    async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let key = self.key_from_url(url)?;

        // Probe first: S3 DeleteObject succeeds on missing keys, but the
        // already-absent case is worth a warning for leak diagnosis.
        if let Err(err) = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                warn!("Object already absent, skipping delete: {url}");
                return Ok(());
            }
            return Err(MediaError::Delete {
                url: url.to_string(),
                message: err.to_string(),
            });
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MediaError::Delete {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn fetch_as_data_uri(&self, url: &str) -> Result<String, MediaError> {
        let key = self.key_from_url(url)?;

        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MediaError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let mime = object
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| MediaError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .into_bytes();

        Ok(encode_data_uri(&mime, &data))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory media store used across the crate's tests. Implements the
    //! contract semantics (idempotent delete, fetch of stored content) and
    //! records every call for order assertions.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MediaCall {
        Upload(String),
        Remove(String),
        Fetch(String),
    }

    #[derive(Default)]
    pub struct InMemoryMediaStore {
        pub objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
        pub calls: Mutex<Vec<MediaCall>>,
        pub fail_uploads: Mutex<bool>,
        /// URLs whose fetch should fail.
        pub broken_fetches: Mutex<Vec<String>>,
        counter: Mutex<u32>,
    }

    impl InMemoryMediaStore {
        pub fn calls(&self) -> Vec<MediaCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn contains(&self, url: &str) -> bool {
            self.objects.lock().unwrap().contains_key(url)
        }

        /// Seeds a stored object and returns its ref.
        pub fn put(&self, url: &str, mime: &str, data: &[u8]) {
            self.objects
                .lock()
                .unwrap()
                .insert(url.to_string(), (mime.to_string(), data.to_vec()));
        }
    }

    #[async_trait]
    impl MediaStore for InMemoryMediaStore {
        async fn upload(
            &self,
            owner: Uuid,
            category: MediaCategory,
            source: MediaSource,
            name: Option<String>,
        ) -> Result<String, MediaError> {
            let (data, mime) = source.into_parts().await?;
            if *self.fail_uploads.lock().unwrap() {
                return Err(MediaError::Upload {
                    key: "test".to_string(),
                    message: "injected upload failure".to_string(),
                });
            }
            let n = {
                let mut counter = self.counter.lock().unwrap();
                *counter += 1;
                *counter
            };
            let file_name = name.unwrap_or_else(|| format!("object-{n}"));
            let url = format!("mem://{owner}/{}/{file_name}", category.as_str());
            self.objects
                .lock()
                .unwrap()
                .insert(url.clone(), (mime, data));
            self.calls.lock().unwrap().push(MediaCall::Upload(url.clone()));
            Ok(url)
        }

        async fn remove(&self, url: &str) -> Result<(), MediaError> {
            self.calls
                .lock()
                .unwrap()
                .push(MediaCall::Remove(url.to_string()));
            if self.objects.lock().unwrap().remove(url).is_none() {
                warn!("Object already absent, skipping delete: {url}");
            }
            Ok(())
        }

        async fn fetch_as_data_uri(&self, url: &str) -> Result<String, MediaError> {
            self.calls
                .lock()
                .unwrap()
                .push(MediaCall::Fetch(url.to_string()));
            if self.broken_fetches.lock().unwrap().iter().any(|u| u == url) {
                return Err(MediaError::Fetch {
                    url: url.to_string(),
                    message: "injected fetch failure".to_string(),
                });
            }
            let objects = self.objects.lock().unwrap();
            let (mime, data) = objects.get(url).ok_or_else(|| MediaError::Fetch {
                url: url.to_string(),
                message: "not found".to_string(),
            })?;
            Ok(encode_data_uri(mime, data))
        }
    }
}
