use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;

use pipewatch::engine::types::{AlertKind, PipelineState};
use pipewatch::notify::Notifier;
use pipewatch::notify::card::{CardDetails, CardLanguage, MessageCard, build_card};
use pipewatch::notify::webhook::WebhookNotifier;

/// Spawn a mock HTTP server that accepts one connection and returns a canned response.
/// The join handle yields the raw request it received.
fn spawn_mock_server(status_line: &str, body: &str) -> (String, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}/webhookb2/secret-token", addr);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    spawn_raw_server(listener, url, response)
}

/// Like [`spawn_mock_server`], but writes `response` verbatim.
fn spawn_raw_server(
    listener: TcpListener,
    url: String,
    response: String,
) -> (String, std::thread::JoinHandle<String>) {
    let handle = std::thread::spawn(move || {
        let mut received = Vec::new();
        for mut stream in listener.incoming().take(1).flatten() {
            read_request(&mut stream, &mut received);
            let _ = stream.write_all(response.as_bytes());
        }
        String::from_utf8_lossy(&received).to_string()
    });
    (url, handle)
}

/// Read headers, then as many body bytes as Content-Length announces.
fn read_request(stream: &mut std::net::TcpStream, received: &mut Vec<u8>) {
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            return;
        }
        received.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(received);
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
            if received.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

fn failure_card() -> MessageCard {
    build_card(
        AlertKind::Failure,
        &CardDetails {
            pipeline: "billing-api",
            state: &PipelineState::Failed,
            executed_at: "05-03-2025 14:22:01",
            account_id: "123456789012",
            region: "sa-east-1",
            pipeline_url: "https://console.aws.amazon.com/codesuite/codepipeline/pipelines/billing-api/view?region=sa-east-1",
        },
        CardLanguage::Pt,
    )
}

fn notifier() -> WebhookNotifier {
    WebhookNotifier::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn posts_card_as_json() {
    let (url, handle) = spawn_mock_server("200 OK", "1");

    let delivery = notifier().send(&url, &failure_card()).await.unwrap();
    assert_eq!(delivery.status, 200);
    assert!(delivery.success);
    assert_eq!(delivery.body, "1");

    let received = handle.join().unwrap();
    assert!(received.starts_with("POST /webhookb2/secret-token"), "got: {}", received);
    assert!(
        received.to_ascii_lowercase().contains("content-type: application/json"),
        "Expected JSON content type, got: {}",
        received
    );
    assert!(received.contains("\"@type\":\"MessageCard\""));
    assert!(received.contains("Pipeline: billing-api"));
}

#[tokio::test]
async fn no_content_counts_as_success() {
    let (url, _handle) = spawn_mock_server("204 No Content", "");

    let delivery = notifier().send(&url, &failure_card()).await.unwrap();
    assert_eq!(delivery.status, 204);
    assert!(delivery.success);
}

#[tokio::test]
async fn server_error_is_reported_not_raised() {
    let (url, _handle) = spawn_mock_server("500 Internal Server Error", "Webhook disabled");

    let delivery = notifier().send(&url, &failure_card()).await.unwrap();
    assert_eq!(delivery.status, 500);
    assert!(!delivery.success);
    assert_eq!(delivery.body, "Webhook disabled");
}

#[tokio::test]
async fn other_2xx_is_not_success() {
    let (url, _handle) = spawn_mock_server("202 Accepted", "");

    let delivery = notifier().send(&url, &failure_card()).await.unwrap();
    assert_eq!(delivery.status, 202);
    assert!(!delivery.success);
}

#[tokio::test]
async fn transport_error_hides_webhook_url() {
    // Bind then drop to get a port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{}/webhookb2/secret-token", port);

    let err = notifier().send(&url, &failure_card()).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(!message.contains("secret-token"), "URL leaked: {}", message);
}

#[tokio::test]
async fn truncated_rejection_body_still_reports_status() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/webhookb2/secret-token", listener.local_addr().unwrap());
    // Announces more body than it sends, then closes.
    let response = "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 64\r\nConnection: close\r\n\r\npartial".to_string();
    let (url, handle) = spawn_raw_server(listener, url, response);

    let delivery = notifier().send(&url, &failure_card()).await.unwrap();
    handle.join().unwrap();

    assert_eq!(delivery.status, 500);
    assert!(!delivery.success);
    assert!(delivery.body.is_empty());
}
