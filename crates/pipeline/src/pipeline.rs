//! Two-phase generation pipeline: generate, then upscale one candidate.

use tracing::{debug, info};

use crate::capability::{CapabilityFuture, GenerateCapability, UpscaleCapability};
use crate::error::PipelineError;
use crate::progress::{ProgressHandle, ProgressReporter};
use crate::retry::RetryPolicy;
use crate::types::{GenerationResult, Phase, PhaseState, UpscaleJob, UpscaleResult};

/// Candidate upscaled when none is configured: the first of the grid.
pub const DEFAULT_CANDIDATE_INDEX: u8 = 1;

/// Number of candidates in a generated grid.
pub const CANDIDATE_COUNT: u8 = 4;

/// Drives one prompt through generate and upscale.
///
/// Each phase repeats its capability call while it returns an empty result,
/// under that phase's [`RetryPolicy`]. Upscale starts only after generate
/// has produced its terminal result.
pub struct GenerationPipeline<'a> {
    generator: &'a dyn GenerateCapability,
    upscaler: &'a dyn UpscaleCapability,
    generate_policy: RetryPolicy,
    upscale_policy: RetryPolicy,
    candidate_index: u8,
}

impl<'a> GenerationPipeline<'a> {
    /// Creates a pipeline with unbounded retries and the default candidate.
    pub fn new(generator: &'a dyn GenerateCapability, upscaler: &'a dyn UpscaleCapability) -> Self {
        Self {
            generator,
            upscaler,
            generate_policy: RetryPolicy::default(),
            upscale_policy: RetryPolicy::default(),
            candidate_index: DEFAULT_CANDIDATE_INDEX,
        }
    }

    /// Uses `policy` for both phases.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.generate_policy = policy.clone();
        self.upscale_policy = policy;
        self
    }

    pub fn with_generate_policy(mut self, policy: RetryPolicy) -> Self {
        self.generate_policy = policy;
        self
    }

    pub fn with_upscale_policy(mut self, policy: RetryPolicy) -> Self {
        self.upscale_policy = policy;
        self
    }

    /// Selects which candidate of the generated grid is upscaled (1-based).
    pub fn with_candidate_index(mut self, index: u8) -> Self {
        self.candidate_index = index;
        self
    }

    /// Runs both phases and returns the upscaled asset reference.
    pub async fn run(
        &self,
        prompt: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<UpscaleResult, PipelineError> {
        let generation = self.generate(prompt, reporter).await?;
        info!(
            job_id = %generation.job_id,
            hash = %generation.content_hash,
            flags = generation.flags,
            "generation complete"
        );

        let job = UpscaleJob::for_candidate(&generation, self.candidate_index);
        let upscaled = self.upscale(&job, reporter).await?;
        info!(uri = %upscaled.uri, "upscale complete");

        Ok(upscaled)
    }

    async fn generate(
        &self,
        prompt: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<GenerationResult, PipelineError> {
        let progress = ProgressHandle::new(Phase::Generate, reporter);
        let progress = &progress;
        let generator = self.generator;
        run_phase(Phase::Generate, &self.generate_policy, reporter, move || {
            generator.imagine(prompt, progress)
        })
        .await
    }

    async fn upscale(
        &self,
        job: &UpscaleJob,
        reporter: &dyn ProgressReporter,
    ) -> Result<UpscaleResult, PipelineError> {
        let progress = ProgressHandle::new(Phase::Upscale, reporter);
        let progress = &progress;
        let upscaler = self.upscaler;
        run_phase(Phase::Upscale, &self.upscale_policy, reporter, move || {
            upscaler.upscale(job, progress)
        })
        .await
    }
}

/// Issues `call` until it yields a value, the policy runs out, or it fails.
async fn run_phase<'f, T>(
    phase: Phase,
    policy: &RetryPolicy,
    reporter: &dyn ProgressReporter,
    mut call: impl FnMut() -> CapabilityFuture<'f, T>,
) -> Result<T, PipelineError> {
    reporter.phase_changed(phase, PhaseState::Pending);

    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        if attempt > 1 {
            let delay = policy.delay_for_retry(attempt - 1);
            if !delay.is_zero() {
                debug!(phase = %phase, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::time::sleep(delay).await;
            }
        }

        match call().await {
            Ok(Some(value)) => {
                reporter.phase_changed(phase, PhaseState::Done);
                return Ok(value);
            }
            Ok(None) => {
                if !policy.allows(attempt.saturating_add(1)) {
                    return Err(PipelineError::RetryExhausted {
                        phase,
                        attempts: attempt,
                    });
                }
                reporter.phase_changed(phase, PhaseState::Retrying { attempt });
            }
            Err(source) => return Err(PipelineError::Capability { phase, source }),
        }
    }
}
