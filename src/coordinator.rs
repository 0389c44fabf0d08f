//! Detection loop coordinator.
//!
//! Owns the periodic sampling timer, sequences sample → detect → filter for
//! each cycle, and publishes the latest result set plus loop status to
//! observers.
//!
//! Scheduling is fixed-period, measured from one tick's scheduling to the
//! next, so a detect call that runs longer than the interval overlaps the
//! next cycle. Every dispatched cycle therefore carries a monotonically
//! increasing sequence number, and a completion is published only if no
//! higher sequence number has been published yet; a late response from an
//! older cycle is discarded instead of overwriting fresher state.
//!
//! `stop()` is immediately authoritative: it bumps the loop epoch, and any
//! completion carrying an older epoch is discarded unpublished.
//!
//! Sampling runs on the ticker thread with a sampler the thread owns, so
//! two sampling calls can never touch the shared canvas concurrently; only
//! the detect leg of a cycle runs on a worker thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::DetectionConfig;
use crate::detect::{Detection, DetectionResult, Detector, HttpDetector, HttpDetectorConfig};
use crate::error::DetectError;
use crate::sampler::FrameSampler;
use crate::source::{FrameDimensions, VideoSource};

/// Observable state of the detection loop.
///
/// Replaced atomically on every publish; a failed cycle keeps the previous
/// detections (stale-but-valid) and only sets `error`.
#[derive(Clone, Debug, Default)]
pub struct LoopSnapshot {
    pub detections: Vec<Detection>,
    pub total_objects: usize,
    pub is_running: bool,
    /// Most recent cycle failure, cleared by the next successful cycle.
    pub error: Option<String>,
    /// Native resolution the detections were computed against, captured once
    /// per source when its metadata becomes available.
    pub frame_size: Option<FrameDimensions>,
}

struct PublishedState {
    snapshot: LoopSnapshot,
    published_seq: u64,
}

struct Shared {
    detector: Box<dyn Detector>,
    interval: Duration,
    confidence_threshold: f32,
    running: AtomicBool,
    /// Bumped on every stop; completions from older epochs are discarded.
    epoch: AtomicU64,
    cycle_seq: AtomicU64,
    state: Mutex<PublishedState>,
    subscribers: Mutex<Vec<Sender<LoopSnapshot>>>,
}

struct TickerControl {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// The detection loop: `start(source)`, `stop()`, `snapshot()`,
/// `subscribe()`.
pub struct DetectionLoop {
    shared: Arc<Shared>,
    control: Mutex<Option<TickerControl>>,
}

impl DetectionLoop {
    pub fn new(config: &DetectionConfig, detector: Box<dyn Detector>) -> Self {
        Self {
            shared: Arc::new(Shared {
                detector,
                interval: config.interval,
                confidence_threshold: config.confidence_threshold,
                running: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                cycle_seq: AtomicU64::new(0),
                state: Mutex::new(PublishedState {
                    snapshot: LoopSnapshot::default(),
                    published_seq: 0,
                }),
                subscribers: Mutex::new(Vec::new()),
            }),
            control: Mutex::new(None),
        }
    }

    /// Loop backed by the HTTP inference service from `config`.
    pub fn with_http_detector(config: &DetectionConfig) -> Self {
        let detector = HttpDetector::new(HttpDetectorConfig {
            endpoint: config.endpoint.clone(),
            timeout: config.request_timeout,
        });
        Self::new(config, Box::new(detector))
    }

    /// Arm the periodic timer against `source`. No-op when the loop is
    /// already running: at most one ticker exists at a time.
    pub fn start(&self, source: Box<dyn VideoSource>) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            log::debug!("detection loop already running; start ignored");
            return;
        }
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        {
            let mut state = self.shared.state.lock().unwrap();
            state.published_seq = 0;
            state.snapshot = LoopSnapshot {
                is_running: true,
                ..LoopSnapshot::default()
            };
            self.shared.cycle_seq.store(0, Ordering::SeqCst);
        }
        self.shared.notify();

        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || run_ticker(shared, source, epoch, stop_rx));
        *self.control.lock().unwrap() = Some(TickerControl { stop_tx, handle });
        log::info!("detection loop started, interval {:?}", self.shared.interval);
    }

    /// Disarm the timer and reset the snapshot to idle. Idempotent; any
    /// in-flight cycle completing after this point is discarded unpublished.
    pub fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.shared.state.lock().unwrap();
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            state.published_seq = 0;
            state.snapshot = LoopSnapshot::default();
        }
        self.shared.notify();

        let control = self.control.lock().unwrap().take();
        if let Some(control) = control {
            drop(control.stop_tx);
            let _ = control.handle.join();
        }
        log::info!("detection loop stopped");
    }

    /// Current published state.
    pub fn snapshot(&self) -> LoopSnapshot {
        self.shared.state.lock().unwrap().snapshot.clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Receive a fresh snapshot on every publish and state transition.
    pub fn subscribe(&self) -> Receiver<LoopSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.shared.subscribers.lock().unwrap().push(tx);
        rx
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_ticker(
    shared: Arc<Shared>,
    mut source: Box<dyn VideoSource>,
    epoch: u64,
    stop_rx: Receiver<()>,
) {
    let mut sampler = FrameSampler::new();
    let mut next_tick = Instant::now();
    loop {
        if !shared.is_current(epoch) {
            break;
        }
        run_cycle(&shared, source.as_mut(), &mut sampler, epoch);

        next_tick += shared.interval;
        let now = Instant::now();
        let wait = if next_tick > now {
            next_tick - now
        } else {
            // Cycle dispatch overran the period: realign instead of bursting
            // to catch up.
            next_tick = now;
            Duration::ZERO
        };
        match stop_rx.recv_timeout(wait) {
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            _ => break,
        }
    }
}

fn run_cycle(shared: &Arc<Shared>, source: &mut dyn VideoSource, sampler: &mut FrameSampler, epoch: u64) {
    let seq = shared.cycle_seq.fetch_add(1, Ordering::SeqCst) + 1;

    let (width, height) = source.native_size();
    if width > 0 && height > 0 {
        shared.record_frame_size(epoch, FrameDimensions { width, height });
    }

    match sampler.sample(source) {
        Ok(frame) => {
            let shared = Arc::clone(shared);
            std::thread::spawn(move || {
                let outcome = shared.detector.detect(&frame, shared.confidence_threshold);
                shared.publish(epoch, seq, outcome);
            });
        }
        Err(err) => {
            // Recoverable: record the error, skip the detect step, keep ticking.
            shared.publish(epoch, seq, Err(err));
        }
    }
}

impl Shared {
    fn is_current(&self, epoch: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Publish one cycle's outcome, unless the loop has stopped since the
    /// cycle was dispatched or a newer cycle already published.
    fn publish(&self, epoch: u64, seq: u64, outcome: Result<DetectionResult, DetectError>) {
        let mut state = self.state.lock().unwrap();
        if self.epoch.load(Ordering::SeqCst) != epoch || !self.running.load(Ordering::SeqCst) {
            log::debug!("cycle {} completed after stop; discarded", seq);
            return;
        }
        if seq <= state.published_seq {
            log::debug!(
                "cycle {} superseded by cycle {}; discarded",
                seq,
                state.published_seq
            );
            return;
        }
        state.published_seq = seq;

        match outcome {
            Ok(result) => {
                state.snapshot.detections = result.detections;
                state.snapshot.total_objects = result.total_objects;
                state.snapshot.error = None;
                log::debug!("cycle {}: {} objects", seq, state.snapshot.total_objects);
            }
            Err(err) => {
                // Stale-but-valid: the previous detections stay published.
                state.snapshot.error = Some(err.to_string());
                log::warn!("cycle {} failed: {}", seq, err);
            }
        }

        let snapshot = state.snapshot.clone();
        drop(state);
        self.send_to_subscribers(snapshot);
    }

    fn record_frame_size(&self, epoch: u64, size: FrameDimensions) {
        let mut state = self.state.lock().unwrap();
        if self.epoch.load(Ordering::SeqCst) != epoch || !self.running.load(Ordering::SeqCst) {
            return;
        }
        if state.snapshot.frame_size.is_some() {
            return;
        }
        state.snapshot.frame_size = Some(size);
        log::info!("source metadata ready: {}x{}", size.width, size.height);

        let snapshot = state.snapshot.clone();
        drop(state);
        self.send_to_subscribers(snapshot);
    }

    fn notify(&self) {
        let snapshot = self.state.lock().unwrap().snapshot.clone();
        self.send_to_subscribers(snapshot);
    }

    fn send_to_subscribers(&self, snapshot: LoopSnapshot) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}
