//! wastewatchd - waste detection loop daemon
//!
//! This daemon:
//! 1. Loads configuration (file + environment)
//! 2. Opens the configured video source
//! 3. Runs the detection loop against the inference service
//! 4. Logs snapshot transitions until Ctrl-C

use anyhow::{anyhow, Result};
use std::sync::mpsc;
use std::time::Duration;

use wastewatch::{DetectionConfig, DetectionLoop, StillSource, TestPatternSource, VideoSource};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = DetectionConfig::load()?;
    log::info!(
        "endpoint={} interval={}ms threshold={} source={}",
        cfg.endpoint,
        cfg.interval.as_millis(),
        cfg.confidence_threshold,
        cfg.source
    );

    let source = open_source(&cfg.source)?;

    let detection_loop = DetectionLoop::with_http_detector(&cfg);
    let updates = detection_loop.subscribe();
    detection_loop.start(source);

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })?;

    let mut last_total = usize::MAX;
    let mut last_error: Option<String> = None;
    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }
        match updates.recv_timeout(Duration::from_millis(200)) {
            Ok(snapshot) => {
                if snapshot.error != last_error {
                    if let Some(err) = &snapshot.error {
                        log::warn!("detection error: {}", err);
                    } else if last_error.is_some() {
                        log::info!("detection recovered");
                    }
                    last_error = snapshot.error.clone();
                }
                if snapshot.total_objects != last_total {
                    log::info!("{} objects in frame", snapshot.total_objects);
                    last_total = snapshot.total_objects;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    detection_loop.stop();
    log::info!("wastewatchd stopped");
    Ok(())
}

fn open_source(spec: &str) -> Result<Box<dyn VideoSource>> {
    if spec.starts_with("stub://") {
        Ok(Box::new(TestPatternSource::new(640, 480)))
    } else if spec.contains("://") {
        Err(anyhow!(
            "unsupported source scheme in '{}'; expected stub:// or a local image path",
            spec
        ))
    } else {
        Ok(Box::new(StillSource::open(spec)?))
    }
}
