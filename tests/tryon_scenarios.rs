//! 端到端场景：真实 `HttpJobClient` 对接本地假服务端。

use std::io::{Cursor, ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use proptest::prelude::*;
use tryon_fit::tryon::{
    ControllerPhase, GENERIC_FAILURE_MESSAGE, GenerateOutcome, ImageRole, ImageSlotCapture, JobStatus,
    JobSubmitter, MISSING_IMAGES_MESSAGE, RESULT_FILE_NAME, RawFile, ResultPresenter, TryOnConfig,
    TryOnController, TryOnError, TryOnJobResponse, TryOnRequest,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 90, 255]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tryon-it-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).expect("create temp dir failed");
    dir
}

fn read_http_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).expect("read request failed");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// 单连接假服务端，返回 (base_url, 收到的请求文本)。
fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let port = listener.local_addr().expect("read local addr failed").port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let request = read_http_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).expect("write response failed");
        stream.flush().expect("flush failed");
        request
    });

    (format!("http://127.0.0.1:{}", port), server)
}

/// 绑定但从不应答的监听端口；用于断言“没有发起任何请求”。
fn silent_listener() -> (String, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    listener.set_nonblocking(true).expect("set nonblocking failed");
    let port = listener.local_addr().expect("read local addr failed").port();
    (format!("http://127.0.0.1:{}", port), listener)
}

fn assert_no_connection(listener: &TcpListener) {
    match listener.accept() {
        Err(err) if err.kind() == ErrorKind::WouldBlock => {}
        Ok(_) => panic!("controller issued a request"),
        Err(err) => panic!("unexpected accept error: {}", err),
    }
}

async fn upload(controller: &TryOnController, role: ImageRole, name: &str, bytes: Vec<u8>) {
    controller
        .set_image(role, RawFile::from_bytes(name, bytes))
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn completed_job_shows_prefixed_result_and_downloads() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"job_id":"j1","status":"completed","result_base64":"AAAA","latency_ms":850}"#,
    );
    let controller = TryOnController::new(TryOnConfig::with_base_url(base_url)).expect("controller init failed");
    upload(&controller, ImageRole::Person, "me.png", png_bytes(4, 4)).await;
    upload(&controller, ImageRole::Clothing, "shirt.png", png_bytes(2, 2)).await;

    let outcome = controller.generate().await.expect("generate should succeed");
    let raw_request = server.join().expect("server thread failed");

    let GenerateOutcome::Completed(job) = outcome else {
        panic!("expected completed outcome, got {:?}", outcome);
    };
    assert_eq!(job.id(), Some("j1"));
    assert_eq!(job.latency_ms(), Some(850));
    assert_eq!(
        job.result_image().map(|r| r.as_str()),
        Some("data:image/png;base64,AAAA")
    );
    assert!(raw_request.starts_with("POST /api/tryon/jobs"));
    assert!(raw_request.contains("\"tenant_id\":\"demo_tenant\""));
    assert!(raw_request.contains("\"person_image\":\"data:image/png;base64,"));
    assert!(raw_request.contains("\"maxRes\":1024"));

    let snapshot = controller.snapshot().expect("snapshot failed");
    assert_eq!(snapshot.phase, ControllerPhase::Completed);
    assert!(snapshot.narration.is_empty());
    assert!(snapshot.error.is_none());

    let presenter = ResultPresenter::new(&controller);
    let view = presenter.view().expect("view failed").expect("view should exist");
    assert_eq!(view.panels()[0].1, job.person_image());
    assert_eq!(view.panels()[2].1, job.clothing_image());

    let dir = temp_dir("download");
    let path = presenter.download_result(&dir).await.expect("download failed");
    let written = std::fs::read(&path).expect("read back failed");
    let _ = std::fs::remove_dir_all(&dir);

    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(RESULT_FILE_NAME));
    assert_eq!(written, vec![0u8, 0, 0]);
}

#[tokio::test]
async fn http_error_detail_becomes_job_message() {
    let (base_url, server) = serve_once("429 Too Many Requests", r#"{"detail":"quota exceeded"}"#);
    let controller = TryOnController::new(TryOnConfig::with_base_url(base_url)).expect("controller init failed");
    upload(&controller, ImageRole::Person, "me.png", png_bytes(4, 4)).await;
    upload(&controller, ImageRole::Clothing, "shirt.png", png_bytes(2, 2)).await;

    let result = controller.generate().await;
    server.join().expect("server thread failed");

    assert_eq!(result, Err(TryOnError::Submission("quota exceeded".to_string())));
    let job = controller.job().expect("job failed").expect("job should exist");
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(job.error_message(), Some("quota exceeded"));
    assert!(job.result_image().is_none());
    assert_eq!(controller.error().expect("error failed").as_deref(), Some("quota exceeded"));
    assert!(controller.narration().expect("narration failed").is_empty());

    let presenter = ResultPresenter::new(&controller);
    assert!(presenter.view().expect("view failed").is_none());
    assert!(matches!(
        presenter.download_result(&std::env::temp_dir()).await,
        Err(TryOnError::Presentation(_))
    ));
}

#[tokio::test]
async fn completed_status_without_result_is_failure() {
    let (base_url, server) = serve_once("200 OK", r#"{"job_id":"j3","status":"completed"}"#);
    let controller = TryOnController::new(TryOnConfig::with_base_url(base_url)).expect("controller init failed");
    upload(&controller, ImageRole::Person, "me.png", png_bytes(4, 4)).await;
    upload(&controller, ImageRole::Clothing, "shirt.png", png_bytes(2, 2)).await;

    let result = controller.generate().await;
    server.join().expect("server thread failed");

    assert_eq!(result, Err(TryOnError::Submission(GENERIC_FAILURE_MESSAGE.to_string())));
    let job = controller.job().expect("job failed").expect("job should exist");
    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job.error_message().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn missing_clothing_never_contacts_backend() {
    let (base_url, listener) = silent_listener();
    let controller = TryOnController::new(TryOnConfig::with_base_url(base_url)).expect("controller init failed");
    upload(&controller, ImageRole::Person, "me.png", png_bytes(4, 4)).await;
    let before = controller.slot(ImageRole::Person).expect("slot failed");

    let result = controller.generate().await;

    assert_eq!(result, Err(TryOnError::Validation(MISSING_IMAGES_MESSAGE.to_string())));
    assert_no_connection(&listener);
    let snapshot = controller.snapshot().expect("snapshot failed");
    assert_eq!(snapshot.phase, ControllerPhase::Idle);
    assert_eq!(snapshot.person, before);
    assert!(snapshot.clothing.is_empty());
    assert!(snapshot.job.is_none());
    assert_eq!(snapshot.error.as_deref(), Some(MISSING_IMAGES_MESSAGE));
}

#[tokio::test]
async fn capture_picks_first_image_from_multi_file_drop() {
    let (base_url, listener) = silent_listener();
    let controller = TryOnController::new(TryOnConfig::with_base_url(base_url)).expect("controller init failed");
    let dir = temp_dir("capture");
    let notes = dir.join("notes.txt");
    let first = dir.join("first.png");
    let second = dir.join("second.png");
    std::fs::write(&notes, b"not an image").expect("write failed");
    std::fs::write(&first, png_bytes(3, 3)).expect("write failed");
    std::fs::write(&second, png_bytes(5, 5)).expect("write failed");

    let capture = ImageSlotCapture::new(ImageRole::Clothing);
    let files = [&notes, &first, &second].into_iter().map(RawFile::from_path);
    let update = capture.deliver(&controller, files).await.expect("deliver failed");
    let ignored = capture
        .deliver(&controller, vec![RawFile::from_path(&notes)])
        .await
        .expect("deliver failed");
    let _ = std::fs::remove_dir_all(&dir);

    assert!(update.is_some());
    assert!(ignored.is_none());
    let slot = controller.slot(ImageRole::Clothing).expect("slot failed");
    assert_eq!(slot.raw_file(), Some(&RawFile::from_path(&first)));
    assert_eq!(
        slot.encoded().and_then(|uri| uri.decode().ok()),
        Some(png_bytes(3, 3))
    );
    assert_no_connection(&listener);
}

#[tokio::test]
async fn reset_after_failure_returns_to_idle() {
    let (base_url, server) = serve_once("500 Internal Server Error", "upstream exploded");
    let controller = TryOnController::new(TryOnConfig::with_base_url(base_url)).expect("controller init failed");
    upload(&controller, ImageRole::Person, "me.png", png_bytes(4, 4)).await;
    upload(&controller, ImageRole::Clothing, "shirt.png", png_bytes(2, 2)).await;

    let result = controller.generate().await;
    server.join().expect("server thread failed");
    assert_eq!(result, Err(TryOnError::Submission(GENERIC_FAILURE_MESSAGE.to_string())));

    ResultPresenter::new(&controller).reset().expect("reset failed");
    controller.reset().expect("second reset failed");

    let snapshot = controller.snapshot().expect("snapshot failed");
    assert_eq!(snapshot.phase, ControllerPhase::Idle);
    assert!(snapshot.person.is_empty());
    assert!(snapshot.clothing.is_empty());
    assert!(snapshot.job.is_none());
    assert!(snapshot.narration.is_empty());
    assert!(snapshot.error.is_none());
}

/// 固定返回给定 payload 的提交实现。
struct EchoPayload(String);

impl JobSubmitter for EchoPayload {
    async fn submit(&self, _request: &TryOnRequest) -> Result<TryOnJobResponse, TryOnError> {
        Ok(TryOnJobResponse {
            job_id: Some("prop".to_string()),
            status: Some("completed".to_string()),
            result_base64: Some(self.0.clone()),
            ..Default::default()
        })
    }
}

proptest! {
    #[test]
    fn displayed_result_is_prefixed_payload(payload in "[A-Za-z0-9+/]{1,64}={0,2}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build runtime failed");

        let result_image = runtime.block_on(async {
            let controller = TryOnController::with_submitter(TryOnConfig::default(), EchoPayload(payload.clone()))
                .expect("controller init failed");
            controller
                .set_image(ImageRole::Person, RawFile::from_bytes("me.png", png_bytes(1, 1)))
                .await
                .expect("upload failed");
            controller
                .set_image(ImageRole::Clothing, RawFile::from_bytes("shirt.png", png_bytes(1, 1)))
                .await
                .expect("upload failed");

            match controller.generate().await.expect("generate failed") {
                GenerateOutcome::Completed(job) => job.result_image().map(|r| r.as_str().to_string()),
                _ => None,
            }
        });

        prop_assert_eq!(result_image, Some(format!("data:image/png;base64,{}", payload)));
    }
}
