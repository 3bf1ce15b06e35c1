//! Trip Planner image upload client
//!
//! This crate uploads cover images to a Cloudinary-compatible image host
//! using an unsigned upload preset, and returns the hosted secure URL.

use bytes::Bytes;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// 既定のアップロードAPIのベースURL
pub const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

/// 結果型
pub type Result<T> = std::result::Result<T, UploadError>;

/// エラー型
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("{0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Upload source not allowed: {0}")]
    SourceNotAllowed(UploadSource),

    #[error("Cropping is disabled for this upload widget")]
    CroppingDisabled,

    #[error("Only one file may be uploaded at a time (got {0})")]
    TooManyFiles(usize),
}

/// アップロード元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadSource {
    Local,
    Camera,
}

impl fmt::Display for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadSource::Local => write!(f, "local"),
            UploadSource::Camera => write!(f, "camera"),
        }
    }
}

/// 切り抜き範囲（ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    fn to_coordinates(self) -> String {
        format!("{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// アップロードする画像ファイル
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub source: UploadSource,
    pub file_name: String,
    pub bytes: Bytes,
    pub crop: Option<CropRect>,
}

impl ImageFile {
    /// メモリ上のデータから作成
    pub fn from_bytes(source: UploadSource, file_name: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            source,
            file_name: file_name.to_string(),
            bytes: bytes.into(),
            crop: None,
        }
    }

    /// ローカルファイルを読み込む
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| UploadError::InvalidFile(path.display().to_string()))?;

        let mut file = File::open(path).await?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        Ok(Self::from_bytes(UploadSource::Local, &file_name, contents))
    }

    /// 切り抜き範囲を設定
    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// アップロードウィジェットの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    pub sources: Vec<UploadSource>,
    pub cropping: bool,
    pub multiple: bool,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            sources: vec![UploadSource::Local, UploadSource::Camera],
            cropping: true,
            multiple: false,
        }
    }
}

impl WidgetOptions {
    fn check(&self, file: &ImageFile) -> Result<()> {
        if !self.sources.contains(&file.source) {
            return Err(UploadError::SourceNotAllowed(file.source));
        }
        if file.crop.is_some() && !self.cropping {
            return Err(UploadError::CroppingDisabled);
        }
        if file.bytes.is_empty() {
            return Err(UploadError::InvalidFile(format!(
                "{} is empty",
                file.file_name
            )));
        }
        Ok(())
    }
}

/// アップロード結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// 画像アップロードクライアント
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    base_url: String,
    cloud_name: String,
    upload_preset: String,
    http_client: Client,
    options: WidgetOptions,
}

impl CloudinaryClient {
    /// 新しいクライアントを作成
    pub fn new(cloud_name: &str, upload_preset: &str, http_client: Client) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
            http_client,
            options: WidgetOptions::default(),
        }
    }

    /// ベースURLを変更（テスト用・ゲートウェイ用）
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// ウィジェット設定を変更
    pub fn with_options(mut self, options: WidgetOptions) -> Self {
        self.options = options;
        self
    }

    /// ウィジェット設定
    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    /// アップロード先URL
    pub fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.base_url, self.cloud_name)
    }

    /// 画像を1枚アップロード
    pub async fn upload(&self, file: ImageFile) -> Result<UploadedImage> {
        self.options.check(&file)?;

        let mut form = Form::new().text("upload_preset", self.upload_preset.clone());
        if let Some(crop) = file.crop {
            form = form.text("custom_coordinates", crop.to_coordinates());
        }

        let part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        form = form.part("file", part);

        debug!(
            "uploading {} from {} to {}",
            file.file_name,
            file.source,
            self.upload_url()
        );

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("Upload failed ({}): {}", status, error_text));
            return Err(UploadError::ApiError(message));
        }

        Ok(response.json::<UploadedImage>().await?)
    }

    /// 複数枚アップロード（`multiple` が無効なら1枚まで）
    pub async fn upload_many(&self, files: Vec<ImageFile>) -> Result<Vec<UploadedImage>> {
        if !self.options.multiple && files.len() > 1 {
            return Err(UploadError::TooManyFiles(files.len()));
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(self.upload(file).await?);
        }
        Ok(uploaded)
    }
}
