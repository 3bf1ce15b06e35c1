//! Image upload capability and the cover-image step of the form

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};
use trip_planner_upload::{CloudinaryClient, ImageFile, UploadedImage, WidgetOptions};

use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::notify::Outcome;

/// Uploads a local image and returns where it is hosted.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, file: ImageFile) -> Result<UploadedImage>;
}

/// [`ImageUploader`] over the hosted image service
pub struct CloudinaryUploader {
    client: CloudinaryClient,
}

impl CloudinaryUploader {
    pub fn new(client: CloudinaryClient) -> Self {
        Self { client }
    }

    /// Builds the uploader from configuration; the cloud name is required.
    pub fn from_config(config: &PlannerConfig, http_client: Client) -> Result<Self> {
        let cloud_name = config
            .cloud_name
            .as_deref()
            .ok_or_else(|| PlannerError::config("CLOUDINARY_CLOUD_NAME is not set"))?;

        let mut client = CloudinaryClient::new(cloud_name, &config.upload_preset, http_client)
            .with_options(WidgetOptions::default());
        if let Some(base_url) = &config.upload_base_url {
            client = client.with_base_url(base_url);
        }
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &CloudinaryClient {
        &self.client
    }
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, file: ImageFile) -> Result<UploadedImage> {
        Ok(self.client.upload(file).await?)
    }
}

/// Holds the uploaded cover image of a draft.
///
/// The hosted URL is both the preview and the value later attached as
/// `coverImage`. A failed upload leaves the previous image in place.
#[derive(Debug, Clone, Default)]
pub struct ImageUploadStep {
    hosted_url: Option<String>,
    uploading: bool,
}

impl ImageUploadStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preview(&self) -> Option<&str> {
        self.hosted_url.as_deref()
    }

    /// Set while `run` awaits the uploader; observable by callers that share the step behind a lock.
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Value stored as `coverImage`: the hosted URL, or "" without an image.
    pub fn cover_image(&self) -> String {
        self.hosted_url.clone().unwrap_or_default()
    }

    pub async fn run(&mut self, uploader: &dyn ImageUploader, file: ImageFile) -> Outcome {
        self.uploading = true;
        let result = uploader.upload(file).await;
        self.uploading = false;

        match result {
            Ok(image) => {
                debug!(public_id = %image.public_id, "cover image uploaded");
                self.hosted_url = Some(image.secure_url);
                Outcome::success("Image uploaded successfully")
            }
            Err(err) => {
                error!(error = %err, "cover image upload failed");
                Outcome::error(err.user_message())
            }
        }
    }

    pub fn clear(&mut self) {
        self.hosted_url = None;
    }
}
