//! Progress reporting for the deploy phases.
//!
//! The pipeline only emits events; rendering belongs to the sink.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Sanitize,
    Audit,
    ResolveContentTypes,
    ClearContainer,
    Upload,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Phase::Sanitize => write!(f, "sanitize"),
            Phase::Audit => write!(f, "audit"),
            Phase::ResolveContentTypes => write!(f, "content-types"),
            Phase::ClearContainer => write!(f, "clear-container"),
            Phase::Upload => write!(f, "upload"),
        }
    }
}

/// Receives structured progress events from the pipeline.
///
/// `tick` may be called concurrently from several workers.
pub trait ProgressSink: Send + Sync {
    fn phase_started(&self, phase: Phase, total: usize);
    fn tick(&self, phase: Phase, item: &str);
    fn phase_finished(&self, phase: Phase);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
}

/// Renders progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressSink for TracingProgress {
    fn phase_started(&self, phase: Phase, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        tracing::info!(phase = %phase, total, "Phase started");
    }

    fn tick(&self, phase: Phase, item: &str) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            phase = %phase,
            item = %item,
            done,
            total = self.total.load(Ordering::Relaxed),
            "Progress"
        );
    }

    fn phase_finished(&self, phase: Phase) {
        tracing::info!(
            phase = %phase,
            done = self.done.load(Ordering::Relaxed),
            "Phase finished"
        );
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { phase: Phase, total: usize },
    Tick { phase: Phase, item: String },
    Finished { phase: Phase },
    Warn(String),
    Info(String),
}

/// Keeps every event in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Warn(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn ticks(&self, phase: Phase) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, ProgressEvent::Tick { phase: p, .. } if *p == phase))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProgressEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: ProgressEvent) {
        self.lock().push(event);
    }
}

impl ProgressSink for RecordingProgress {
    fn phase_started(&self, phase: Phase, total: usize) {
        self.push(ProgressEvent::Started { phase, total });
    }

    fn tick(&self, phase: Phase, item: &str) {
        self.push(ProgressEvent::Tick {
            phase,
            item: item.to_string(),
        });
    }

    fn phase_finished(&self, phase: Phase) {
        self.push(ProgressEvent::Finished { phase });
    }

    fn warn(&self, message: &str) {
        self.push(ProgressEvent::Warn(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(ProgressEvent::Info(message.to_string()));
    }
}
