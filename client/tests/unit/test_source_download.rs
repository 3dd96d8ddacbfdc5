//! Remote deploy sources

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use deployctl::deploy::archive;
use deployctl::deploy::source::Source;
use deployctl::errors::ClientError;

async fn serve_tarball(tarball: Vec<u8>) -> String {
    let app = Router::new()
        .route("/owner/webapi/tarball/v1", get(move || async move { tarball }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_acquire_remote_tarball() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("Procfile"), "web: ./server").unwrap();
    std::fs::create_dir(src.path().join("static")).unwrap();
    std::fs::write(src.path().join("static/index.html"), "<html></html>").unwrap();
    let tarball = archive::create_temp(src.path(), "webapi", &[]).await.unwrap();
    let bytes = std::fs::read(&tarball).unwrap();

    let server = serve_tarball(bytes).await;
    let source = Source::acquire(&format!("{}/owner/webapi/tarball/v1?access_token=abc", server))
        .await
        .unwrap();

    let dir = source.dir().to_path_buf();
    assert_eq!(std::fs::read_to_string(dir.join("Procfile")).unwrap(), "web: ./server");
    assert_eq!(
        std::fs::read_to_string(dir.join("static/index.html")).unwrap(),
        "<html></html>"
    );

    drop(source);
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_download_error_hides_url() {
    let server = serve_tarball(Vec::new()).await;

    let err = Source::acquire(&format!("{}/missing?access_token=topsecret", server))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::HttpError(_)));
    assert!(!err.to_string().contains("topsecret"));
}

#[tokio::test]
async fn test_download_not_a_tarball() {
    let server = serve_tarball(b"definitely not gzip".to_vec()).await;

    let result = Source::acquire(&format!("{}/owner/webapi/tarball/v1", server)).await;

    assert!(result.is_err());
}
