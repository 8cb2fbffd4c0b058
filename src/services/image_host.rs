use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;

const UPLOAD_FOLDER: &str = "chat-app";

/// An uploaded image staged on local disk. The file is removed when the
/// guard drops, whichever way the handler exits.
pub struct StagedFile {
    path: PathBuf,
    file_name: String,
}

impl StagedFile {
    pub async fn stage(dir: &Path, file_name: &str, data: &[u8]) -> Result<Self, std::io::Error> {
        let path = dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
        tokio::fs::write(&path, data).await?;
        Ok(StagedFile {
            path,
            file_name: file_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    #[serde(default)]
    error: Option<UploadError>,
}

#[derive(Deserialize)]
struct UploadError {
    message: String,
}

pub struct ImageHost {
    client: Client,
    upload_url: String,
    upload_preset: Option<String>,
}

impl ImageHost {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let upload_url = config
            .image_upload_url
            .clone()
            .ok_or("IMAGE_UPLOAD_URL must be set")?;

        Ok(ImageHost {
            client: Client::new(),
            upload_url,
            upload_preset: config.image_upload_preset.clone(),
        })
    }

    /// Forwards a staged file to the image host and returns the public
    /// URL of the stored image. No retries; errors surface to the caller.
    pub async fn upload(&self, staged: &StagedFile) -> Result<String, Box<dyn std::error::Error>> {
        let bytes = tokio::fs::read(staged.path()).await?;

        let mut form = reqwest::multipart::Form::new()
            .text("folder", UPLOAD_FOLDER)
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(staged.file_name().to_string()),
            );
        if let Some(preset) = &self.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }

        let response_text = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?
            .text()
            .await?;

        let response: UploadResponse = serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse upload response: {}", e))?;

        match response.secure_url {
            Some(url) => Ok(url),
            None => {
                let message = response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "no secure_url in response".to_string());
                Err(format!("Image host error: {}", message).into())
            }
        }
    }
}
