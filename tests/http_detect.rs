//! HTTP client behavior against a local inference stub, plus an end-to-end
//! loop run over the wire.

use std::io::Read;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tiny_http::{Header, Response, Server};
use wastewatch::{
    DetectError, DetectionConfig, DetectionLoop, Detector, HttpDetector, HttpDetectorConfig,
    SampledFrame, TestPatternSource,
};

const GOOD_BODY: &str = r#"{
    "detections": [
        { "bbox": [100, 200, 300, 400], "class": "sampah", "confidence": 0.9, "class_id": 0 },
        { "bbox": [10, 10, 20, 20], "class": "sampah", "confidence": 0.5, "class_id": 1 }
    ],
    "total_objects": 2,
    "timestamp": 1234
}"#;

fn sample_frame() -> SampledFrame {
    SampledFrame {
        data_url: "data:image/jpeg;base64,AAAA".to_string(),
        width: 1920,
        height: 1080,
        captured_at_ms: 1234,
    }
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).expect("header")
}

/// Serve `handler(request index) -> (status, body)` on an ephemeral port,
/// returning the endpoint URL and a request counter.
fn spawn_stub<F>(handler: F) -> (String, Arc<AtomicUsize>)
where
    F: Fn(usize) -> (u16, String) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("bind stub server");
    let addr = server.server_addr().to_ip().expect("ip listen addr");
    let endpoint = format!("http://{}/detect-video-frame", addr);
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let index = counter.fetch_add(1, Ordering::SeqCst);

            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            assert!(body.contains("\"frame\""), "request missing frame field");
            assert!(
                body.contains("data:image/jpeg;base64,"),
                "frame is not a jpeg data url"
            );
            assert!(body.contains("\"timestamp\""), "request missing timestamp");

            let (status, response_body) = handler(index);
            let response = Response::from_string(response_body)
                .with_status_code(status)
                .with_header(json_header());
            let _ = request.respond(response);
        }
    });

    (endpoint, requests)
}

fn detector_for(endpoint: &str) -> HttpDetector {
    HttpDetector::new(HttpDetectorConfig {
        endpoint: endpoint.to_string(),
        timeout: Duration::from_secs(2),
    })
}

#[test]
fn successful_round_trip_parses_and_filters() {
    let (endpoint, _) = spawn_stub(|_| (200, GOOD_BODY.to_string()));
    let detector = detector_for(&endpoint);

    let result = detector.detect(&sample_frame(), 0.76).expect("detect");

    // The 0.5-confidence detection is filtered; the count is recomputed.
    assert_eq!(result.total_objects, 1);
    assert_eq!(result.detections.len(), 1);
    assert_eq!(result.detections[0].class, "sampah");
    assert_eq!(result.detections[0].bbox.xmin, 100.0);
    assert_eq!(result.detections[0].bbox.ymax, 400.0);
    assert_eq!(result.timestamp_ms, 1234);
}

#[test]
fn http_500_maps_to_service_error() {
    let (endpoint, _) = spawn_stub(|_| (500, r#"{"error": "Model not loaded"}"#.to_string()));
    let detector = detector_for(&endpoint);

    match detector.detect(&sample_frame(), 0.76) {
        Err(DetectError::Service(message)) => {
            assert!(message.contains("500"), "got: {}", message);
        }
        other => panic!("expected Service error, got {:?}", other),
    }
}

#[test]
fn malformed_body_maps_to_protocol_error() {
    let (endpoint, _) = spawn_stub(|_| (200, r#"{"status": "ok"}"#.to_string()));
    let detector = detector_for(&endpoint);

    match detector.detect(&sample_frame(), 0.76) {
        Err(DetectError::Protocol(_)) => {}
        other => panic!("expected Protocol error, got {:?}", other),
    }
}

#[test]
fn connection_refused_maps_to_transport_error() {
    // Grab a free port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let detector = detector_for(&format!("http://{}/detect-video-frame", addr));
    match detector.detect(&sample_frame(), 0.76) {
        Err(DetectError::Transport(_)) => {}
        other => panic!("expected Transport error, got {:?}", other),
    }
}

#[test]
fn loop_keeps_stale_detections_across_service_errors() {
    // First cycle succeeds, every later cycle gets a 500. The published
    // detections must survive while the error is surfaced and the timer
    // keeps ticking.
    let (endpoint, requests) = spawn_stub(|index| {
        if index == 0 {
            (
                200,
                r#"{
                    "detections": [
                        { "bbox": [100, 200, 300, 400], "class": "sampah", "confidence": 0.9, "class_id": 0 }
                    ],
                    "total_objects": 1
                }"#
                .to_string(),
            )
        } else {
            (500, r#"{"error": "Model not loaded"}"#.to_string())
        }
    });

    let cfg = DetectionConfig {
        endpoint,
        interval: Duration::from_millis(100),
        confidence_threshold: 0.76,
        request_timeout: Duration::from_secs(1),
        source: "stub://test".to_string(),
    };
    let detection_loop = DetectionLoop::with_http_detector(&cfg);

    detection_loop.start(Box::new(TestPatternSource::new(64, 48)));
    thread::sleep(Duration::from_millis(650));

    let snapshot = detection_loop.snapshot();
    assert_eq!(snapshot.total_objects, 1, "stale-but-valid result lost");
    assert_eq!(snapshot.detections.len(), 1);
    let error = snapshot.error.expect("service errors must be surfaced");
    assert!(error.contains("500"), "got: {}", error);
    assert!(snapshot.is_running);
    assert!(
        requests.load(Ordering::SeqCst) >= 3,
        "timer must keep ticking through failures"
    );

    detection_loop.stop();
    let snapshot = detection_loop.snapshot();
    assert!(snapshot.detections.is_empty());
    assert_eq!(snapshot.error, None);
}
