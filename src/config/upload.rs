use std::env;

/// Where uploaded images land on disk and the URL prefix they are served under.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
    pub public_url: String,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            public_url: env::var("PUBLIC_UPLOAD_URL").unwrap_or_else(|_| "/uploads".to_string()),
        }
    }
}
