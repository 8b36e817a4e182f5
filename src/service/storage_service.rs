// service/storage_service.rs
use reqwest::{multipart, Client};
use serde::Deserialize;
use uuid::Uuid;

use super::error::ServiceError;

/// Cloudinary unsigned-upload client. Submission persists nothing until the
/// upload has produced a stable secure URL.
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryClient {
    pub fn new(client: Client, cloud_name: String, upload_preset: String) -> Self {
        Self {
            client,
            cloud_name,
            upload_preset,
        }
    }

    pub async fn upload_image(
        &self,
        image_bytes: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<String, ServiceError> {
        if image_bytes.is_empty() {
            return Err(ServiceError::Upload("image file is empty".to_string()));
        }

        let part = multipart::Part::bytes(image_bytes).file_name(filename.to_owned());

        let form = multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_owned())
            .text("public_id", Uuid::new_v4().to_string())
            .part("file", part);

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Upload(format!("upload request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upload(format!(
                "storage returned HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Upload(format!("upload response body: {}", e)))?;

        Ok(body.secure_url)
    }
}
