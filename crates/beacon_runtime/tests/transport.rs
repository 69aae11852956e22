use std::sync::Arc;
use std::time::Duration;

use beacon_runtime::{
    BeaconRequest, DeliveryStatus, PostSettings, Poster, QueuedTransport, ReqwestPoster,
    Transport, TransportError,
};
use url::Url;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(server: &MockServer, body: &str) -> BeaconRequest {
    BeaconRequest {
        endpoint: Url::parse(&format!("{}/api/event", server.uri())).unwrap(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn poster_sends_plain_text_json() {
    let server = MockServer::start().await;
    let body = r#"{"n":"pageview","u":"https://example.com/","d":"example.com","r":null}"#;
    Mock::given(method("POST"))
        .and(path("/api/event"))
        .and(header("content-type", "text/plain"))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let poster = ReqwestPoster::new(PostSettings::default()).unwrap();
    let status = poster.post(&request(&server, body)).await.expect("post ok");

    assert_eq!(status, DeliveryStatus { status: 202 });
}

#[tokio::test]
async fn poster_reports_error_statuses_as_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let poster = ReqwestPoster::new(PostSettings::default()).unwrap();
    let status = poster.post(&request(&server, "{}")).await.expect("post ok");

    assert_eq!(status.status, 500);
}

#[tokio::test]
async fn poster_times_out_on_slow_collector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_millis(250)))
        .mount(&server)
        .await;

    let settings = PostSettings {
        request_timeout: Duration::from_millis(50),
        ..PostSettings::default()
    };
    let poster = ReqwestPoster::new(settings).unwrap();
    let err = poster.post(&request(&server, "{}")).await.unwrap_err();

    assert!(matches!(err, TransportError::Timeout(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn queued_transport_reports_status_to_callback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/event"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let transport =
        QueuedTransport::new(Arc::new(ReqwestPoster::new(PostSettings::default()).unwrap()));
    let (tx, rx) = tokio::sync::oneshot::channel();
    transport
        .send(
            request(&server, "{}"),
            Some(Box::new(move |status| {
                let _ = tx.send(status);
            })),
        )
        .expect("queued");

    let status = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("callback in time")
        .expect("callback invoked");
    assert_eq!(status, Some(DeliveryStatus { status: 202 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_delivery_is_dropped_without_callback() {
    let endpoint = {
        // Bind and release a port so nothing is listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        Url::parse(&format!("http://127.0.0.1:{port}/api/event")).unwrap()
    };
    let transport =
        QueuedTransport::new(Arc::new(ReqwestPoster::new(PostSettings::default()).unwrap()));
    let (tx, rx) = tokio::sync::oneshot::channel::<Option<DeliveryStatus>>();

    transport
        .send(
            BeaconRequest {
                endpoint,
                body: "{}".to_string(),
            },
            Some(Box::new(move |status| {
                let _ = tx.send(status);
            })),
        )
        .expect("queued");

    // The callback is dropped unused, which closes the channel.
    let outcome = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("settled in time");
    assert!(outcome.is_err());
}
