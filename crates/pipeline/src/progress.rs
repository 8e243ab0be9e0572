//! Progress reporting for pipeline runs.
//!
//! The caller supplies a [`ProgressReporter`]; capabilities only see a
//! [`ProgressHandle`] bound to the phase they are serving.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::{Phase, PhaseState, ProgressEvent};

/// Receives progress and phase transitions from a pipeline run.
pub trait ProgressReporter: Send + Sync {
    /// Called for every interim progress event of a running phase.
    fn report(&self, phase: Phase, event: &ProgressEvent);

    /// Called when a phase changes state.
    fn phase_changed(&self, _phase: Phase, _state: PhaseState) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(Phase, &ProgressEvent) + Send + Sync,
{
    fn report(&self, phase: Phase, event: &ProgressEvent) {
        self(phase, event)
    }
}

/// Narrow progress sink handed to a capability for one phase.
pub struct ProgressHandle<'a> {
    phase: Phase,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ProgressHandle<'a> {
    pub fn new(phase: Phase, reporter: &'a dyn ProgressReporter) -> Self {
        Self { phase, reporter }
    }

    /// Forwards one progress notification to the run's reporter.
    pub fn report(&self, uri: &str, progress: &str) {
        let event = ProgressEvent {
            uri: uri.to_string(),
            progress: progress.to_string(),
        };
        self.reporter.report(self.phase, &event);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _phase: Phase, _event: &ProgressEvent) {}
}

/// Writes progress lines through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, phase: Phase, event: &ProgressEvent) {
        info!(
            uri = %event.uri,
            progress = %event.progress,
            "{}.loading",
            phase.label()
        );
    }

    fn phase_changed(&self, phase: Phase, state: PhaseState) {
        match state {
            PhaseState::Pending => info!(phase = %phase, "submitting"),
            PhaseState::Retrying { attempt } => {
                warn!(phase = %phase, attempt, "empty result, retrying")
            }
            PhaseState::Done => debug!(phase = %phase, "phase complete"),
        }
    }
}

/// Event forwarded by [`ChannelReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Progress { phase: Phase, event: ProgressEvent },
    PhaseChanged { phase: Phase, state: PhaseState },
}

/// Forwards progress into an mpsc channel for another task to consume.
///
/// Never blocks the pipeline: events are dropped with a warning when the
/// channel is full or closed.
pub struct ChannelReporter {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }

    fn forward(&self, event: PipelineEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!("failed to forward pipeline event: {e}");
        }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, phase: Phase, event: &ProgressEvent) {
        self.forward(PipelineEvent::Progress {
            phase,
            event: event.clone(),
        });
    }

    fn phase_changed(&self, phase: Phase, state: PhaseState) {
        self.forward(PipelineEvent::PhaseChanged { phase, state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn handle_tags_events_with_its_phase() {
        let seen = Mutex::new(Vec::new());
        let reporter = |phase: Phase, event: &ProgressEvent| {
            seen.lock().unwrap().push((phase, event.progress.clone()));
        };

        let handle = ProgressHandle::new(Phase::Upscale, &reporter);
        handle.report("https://cdn.example.com/p.webp", "50%");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(Phase::Upscale, "50%".to_string())]);
    }

    #[tokio::test]
    async fn channel_reporter_forwards_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let reporter = ChannelReporter::new(tx);

        reporter.phase_changed(Phase::Generate, PhaseState::Pending);
        reporter.report(
            Phase::Generate,
            &ProgressEvent {
                uri: "u".into(),
                progress: "10%".into(),
            },
        );

        assert_eq!(
            rx.recv().await.unwrap(),
            PipelineEvent::PhaseChanged {
                phase: Phase::Generate,
                state: PhaseState::Pending
            }
        );
        match rx.recv().await.unwrap() {
            PipelineEvent::Progress { phase, event } => {
                assert_eq!(phase, Phase::Generate);
                assert_eq!(event.progress, "10%");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn channel_reporter_drops_when_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let reporter = ChannelReporter::new(tx);
        // Must not panic.
        reporter.phase_changed(Phase::Upscale, PhaseState::Done);
    }
}
