use std::sync::Mutex;

use tempfile::NamedTempFile;

use wastewatch::config::DetectionConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "WASTEWATCH_CONFIG",
        "WASTEWATCH_ENDPOINT",
        "WASTEWATCH_INTERVAL_MS",
        "WASTEWATCH_CONFIDENCE",
        "WASTEWATCH_TIMEOUT_MS",
        "WASTEWATCH_SOURCE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = DetectionConfig::load().expect("load config");

    assert_eq!(cfg.endpoint, "http://localhost:5001/detect-video-frame");
    assert_eq!(cfg.interval.as_millis(), 500);
    assert_eq!(cfg.confidence_threshold, 0.76);
    assert_eq!(cfg.request_timeout.as_millis(), 10_000);
    assert_eq!(cfg.source, "stub://camera");

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "endpoint": "http://10.0.0.2:5001/detect-video-frame",
        "interval_ms": 300,
        "confidence_threshold": 0.6,
        "timeout_ms": 2000,
        "source": "frames/still.jpg"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("WASTEWATCH_CONFIG", file.path());
    std::env::set_var("WASTEWATCH_CONFIDENCE", "0.9");
    std::env::set_var("WASTEWATCH_SOURCE", "stub://bench");

    let cfg = DetectionConfig::load().expect("load config");

    assert_eq!(cfg.endpoint, "http://10.0.0.2:5001/detect-video-frame");
    assert_eq!(cfg.interval.as_millis(), 300);
    assert_eq!(cfg.confidence_threshold, 0.9, "env must beat the file");
    assert_eq!(cfg.request_timeout.as_millis(), 2000);
    assert_eq!(cfg.source, "stub://bench");

    clear_env();
}

#[test]
fn out_of_range_threshold_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("WASTEWATCH_CONFIDENCE", "1.5");
    assert!(DetectionConfig::load().is_err());

    clear_env();
}

#[test]
fn non_numeric_interval_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("WASTEWATCH_INTERVAL_MS", "soon");
    assert!(DetectionConfig::load().is_err());

    clear_env();
}
