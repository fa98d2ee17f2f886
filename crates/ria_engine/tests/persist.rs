use std::fs;

use pretty_assertions::assert_eq;
use ria_core::JobId;
use ria_engine::{download_artifact, ApiSettings, AtomicFileWriter, FailureKind, ReqwestApi};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn writer_creates_directory_and_replaces_files() {
    let dir = tempdir().unwrap();
    let target_dir = dir.path().join("nested").join("output");
    let writer = AtomicFileWriter::new(target_dir.clone());

    let path = writer.write("results.xlsx", b"first").unwrap();
    assert_eq!(path, target_dir.join("results.xlsx"));
    writer.write("results.xlsx", b"second").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"second");

    let leftovers: Vec<_> = fs::read_dir(&target_dir).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn writer_refuses_a_file_as_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("taken");
    fs::write(&file, b"x").unwrap();

    let err = AtomicFileWriter::new(file).write("a.xlsx", b"y").unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

#[tokio::test]
async fn artifact_lands_under_server_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    r#"attachment; filename="2024-01-01_2024-01-31_predictions.xlsx""#,
                )
                .set_body_bytes(b"sheet".to_vec()),
        )
        .mount(&server)
        .await;
    let api = ReqwestApi::new(ApiSettings::with_base_url(&server.uri()).unwrap()).unwrap();
    let dir = tempdir().unwrap();

    let saved = download_artifact(&api, &JobId::from("p1"), dir.path())
        .await
        .unwrap();
    assert_eq!(
        saved,
        dir.path().join("2024-01-01_2024-01-31_predictions.xlsx")
    );
    assert_eq!(fs::read(saved).unwrap(), b"sheet");
}

#[tokio::test]
async fn artifact_without_name_uses_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"sheet".to_vec()))
        .mount(&server)
        .await;
    let api = ReqwestApi::new(ApiSettings::with_base_url(&server.uri()).unwrap()).unwrap();
    let dir = tempdir().unwrap();

    let saved = download_artifact(&api, &JobId::from("abc"), dir.path())
        .await
        .unwrap();
    assert_eq!(saved, dir.path().join("abc.xlsx"));
}

#[tokio::test]
async fn unfinished_job_download_fails_without_writing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/abc"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "detail": "Job not completed" })),
        )
        .mount(&server)
        .await;
    let api = ReqwestApi::new(ApiSettings::with_base_url(&server.uri()).unwrap()).unwrap();
    let dir = tempdir().unwrap();

    let err = download_artifact(&api, &JobId::from("abc"), dir.path())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "Job not completed");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unwritable_output_is_an_io_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"sheet".to_vec()))
        .mount(&server)
        .await;
    let api = ReqwestApi::new(ApiSettings::with_base_url(&server.uri()).unwrap()).unwrap();
    let dir = tempdir().unwrap();
    let blocked = dir.path().join("file");
    fs::write(&blocked, b"x").unwrap();

    let err = download_artifact(&api, &JobId::from("abc"), &blocked)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}
