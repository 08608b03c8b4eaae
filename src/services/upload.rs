use crate::{
    config::upload::UploadConfig,
    error::{AppError, AppResult},
    utils::text::sanitize_filename,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5 MB
pub const BUCKETS: &[&str] = &["post-images", "avatars"];
pub const DEFAULT_BUCKET: &str = "post-images";
pub const DEFAULT_FOLDER: &str = "content";

/// Accepted image types and the extension each is stored under.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Where uploaded bytes end up. Returns the public URL of the stored object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
}

/// Objects written under a directory on local disk and served by the app
/// itself under `public_url`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.upload_dir, &config.public_url)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(format!("{}/{}", self.public_url, key))
    }
}

/// One multipart upload after the form has been read.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Option<Vec<u8>>,
    pub bucket: Option<String>,
    pub folder: Option<String>,
}

pub struct UploadService;

impl UploadService {
    /// Validate and store an image for `user_id`; returns its public URL.
    pub async fn store_image(
        store: &dyn ObjectStore,
        user_id: i32,
        request: UploadRequest,
        now: NaiveDateTime,
    ) -> AppResult<String> {
        let bytes = request
            .bytes
            .ok_or_else(|| AppError::validation("No file provided"))?;

        let mime = declared_type(request.content_type.as_deref(), request.file_name.as_deref())
            .ok_or_else(|| AppError::validation("Invalid file type"))?;
        let ext = IMAGE_TYPES
            .iter()
            .find(|(essence, _)| *essence == mime.essence_str())
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                AppError::validation("Unsupported image type. Allowed: jpeg, png, gif, webp")
            })?;
        if !matches_magic_bytes(&bytes, ext) {
            return Err(AppError::validation(
                "File content does not match declared content type",
            ));
        }

        if bytes.len() > MAX_FILE_SIZE {
            return Err(AppError::validation("File too large"));
        }

        let bucket = request
            .bucket
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        if !BUCKETS.contains(&bucket.as_str()) {
            return Err(AppError::validation("Unknown bucket"));
        }

        let key = object_key(
            &bucket,
            user_id,
            request.folder.as_deref(),
            now,
            &Uuid::new_v4().simple().to_string()[..8],
            ext,
        );

        let url = store
            .put(&key, bytes, mime.essence_str())
            .await
            .map_err(AppError::Internal)?;
        tracing::info!(user_id, %key, "image uploaded");
        Ok(url)
    }
}

/// `<bucket>/<user>/<folder>/<millis>-<random>.<ext>`, with the folder reduced
/// to a single safe path segment.
fn object_key(
    bucket: &str,
    user_id: i32,
    folder: Option<&str>,
    now: NaiveDateTime,
    random: &str,
    ext: &str,
) -> String {
    let folder = folder
        .map(|f| sanitize_filename(f).replace('.', ""))
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FOLDER.to_string());
    format!(
        "{bucket}/{user_id}/{folder}/{}-{random}.{ext}",
        now.and_utc().timestamp_millis()
    )
}

/// The part's content type, or one guessed from the file name when the
/// client sent none. Only the type is taken from the name, never the extension.
fn declared_type(content_type: Option<&str>, file_name: Option<&str>) -> Option<mime::Mime> {
    match content_type.filter(|ct| !ct.is_empty()) {
        Some(ct) => ct.parse().ok(),
        None => file_name.and_then(|name| mime_guess::from_path(name).first()),
    }
}

fn matches_magic_bytes(data: &[u8], ext: &str) -> bool {
    match ext {
        "jpg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "png" => data.starts_with(&[0x89, b'P', b'N', b'G']),
        "gif" => data.starts_with(b"GIF8"),
        "webp" => data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put(&self, key: &str, _bytes: Vec<u8>, _ct: &str) -> anyhow::Result<String> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(format!("/uploads/{key}"))
        }
    }

    fn now() -> NaiveDateTime {
        DateTime::from_timestamp_millis(1_700_000_000_000)
            .unwrap()
            .naive_utc()
    }

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn png(bytes: usize) -> UploadRequest {
        let mut data = vec![0u8; bytes.max(PNG_HEADER.len())];
        data[..PNG_HEADER.len()].copy_from_slice(&PNG_HEADER);
        UploadRequest {
            file_name: Some("Photo.PNG".into()),
            content_type: Some("image/png".into()),
            bytes: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn key_layout() {
        let key = object_key("avatars", 7, Some("My Folder"), now(), "abcd1234", "png");
        assert_eq!(key, "avatars/7/my-folder/1700000000000-abcd1234.png");
    }

    #[test]
    fn traversal_in_folder_is_neutralised() {
        let key = object_key("post-images", 1, Some("../.."), now(), "r", "jpg");
        assert_eq!(key, "post-images/1/content/1700000000000-r.jpg");
    }

    #[test]
    fn magic_bytes_per_type() {
        assert!(matches_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0], "jpg"));
        assert!(matches_magic_bytes(b"GIF89a", "gif"));
        assert!(matches_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 ", "webp"));
        assert!(!matches_magic_bytes(b"<script>", "png"));
        assert!(!matches_magic_bytes(b"RIFF", "webp"));
    }

    #[test]
    fn type_guessed_from_name_only_when_missing() {
        let guessed = declared_type(None, Some("cover.png")).unwrap();
        assert_eq!(guessed.essence_str(), "image/png");
        let declared = declared_type(Some("image/gif"), Some("cover.png")).unwrap();
        assert_eq!(declared.essence_str(), "image/gif");
    }

    #[tokio::test]
    async fn stored_extension_ignores_client_name() {
        let store = RecordingStore::default();
        let request = UploadRequest {
            file_name: Some("evil.html".into()),
            ..png(10)
        };
        let url = UploadService::store_image(&store, 3, request, now())
            .await
            .unwrap();
        assert!(url.ends_with(".png"), "{url}");
    }

    #[tokio::test]
    async fn stores_valid_image() {
        let store = RecordingStore::default();
        let url = UploadService::store_image(&store, 3, png(10), now())
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/post-images/3/content/1700000000000-"));
        assert!(url.ends_with(".png"));
        assert_eq!(store.keys.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_bad_uploads() {
        let store = RecordingStore::default();

        let missing = UploadRequest::default();
        let not_image = UploadRequest {
            content_type: Some("application/pdf".into()),
            ..png(10)
        };
        let bad_bucket = UploadRequest {
            bucket: Some("secrets".into()),
            ..png(10)
        };
        let svg = UploadRequest {
            content_type: Some("image/svg+xml".into()),
            bytes: Some(b"<svg onload=alert(1)>".to_vec()),
            ..png(10)
        };
        let disguised = UploadRequest {
            bytes: Some(b"<script>alert(1)</script>".to_vec()),
            ..png(10)
        };

        for request in [
            missing,
            not_image,
            bad_bucket,
            svg,
            disguised,
            png(MAX_FILE_SIZE + 1),
        ] {
            let result = UploadService::store_image(&store, 3, request, now()).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert!(store.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_store_writes_under_root() {
        let root = std::env::temp_dir().join(format!("lekhok-upload-{}", Uuid::new_v4()));
        let store = LocalObjectStore::new(&root, "/uploads/");
        let url = store
            .put("avatars/1/content/x.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/avatars/1/content/x.png");
        let written = tokio::fs::read(root.join("avatars/1/content/x.png")).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
