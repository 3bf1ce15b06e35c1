use serde_json::json;
use std::io::Write;
use trip_planner_upload::{CloudinaryClient, ImageFile, UploadError, UploadSource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn body_contains(needle: &'static str) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |request: &Request| String::from_utf8_lossy(&request.body).contains(needle)
}

#[test]
fn test_upload_local_file_sends_preset_and_file() {
    tokio_test::block_on(async {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo-cloud/image/upload"))
            .and(body_contains("name=\"upload_preset\""))
            .and(body_contains("unsigned_uploads"))
            .and(body_contains("filename=\"cover.png\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "cover",
                "secure_url": "https://res.cloudinary.com/demo-cloud/image/upload/cover.png"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("cover.png");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(b"not really a png").unwrap();

        let image = ImageFile::from_path(&file_path).await.unwrap();
        assert_eq!(image.source, UploadSource::Local);

        let client = CloudinaryClient::new("demo-cloud", "unsigned_uploads", reqwest::Client::new())
            .with_base_url(&mock_server.uri());
        let uploaded = client.upload(image).await.unwrap();

        assert_eq!(
            uploaded.secure_url,
            "https://res.cloudinary.com/demo-cloud/image/upload/cover.png"
        );
        assert_eq!(uploaded.format, None);
    });
}

#[test]
fn test_missing_file_is_an_io_error() {
    tokio_test::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageFile::from_path(&dir.path().join("missing.png")).await;
        assert!(matches!(result, Err(UploadError::IoError(_))));
    });
}
