//! Data types flowing through a single pipeline run.

use std::fmt;

/// The two remote phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Generate,
    Upscale,
}

impl Phase {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generate => "imagine",
            Self::Upscale => "upscale",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// First call not yet answered.
    Pending,
    /// The last `attempt` calls all returned an empty result.
    Retrying { attempt: u32 },
    /// A non-empty result was produced.
    Done,
}

/// A submitted generation job, as returned by the generate capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub job_id: String,
    pub content_hash: String,
    /// Provider-defined flag bits, passed back verbatim on upscale.
    pub flags: u32,
    /// Grid preview, when the service reported one.
    pub preview_uri: Option<String>,
}

/// Parameters for upscaling one candidate of a finished generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleJob {
    /// 1-based position of the candidate in the generated grid.
    pub candidate_index: u8,
    pub job_id: String,
    pub content_hash: String,
    pub flags: u32,
}

impl UpscaleJob {
    /// Builds the upscale parameters for `candidate_index` of `generation`.
    pub fn for_candidate(generation: &GenerationResult, candidate_index: u8) -> Self {
        Self {
            candidate_index,
            job_id: generation.job_id.clone(),
            content_hash: generation.content_hash.clone(),
            flags: generation.flags,
        }
    }
}

/// The final asset produced by the upscale phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleResult {
    pub uri: String,
}

/// Interim notification while a remote job is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Partial asset reference rendered so far.
    pub uri: String,
    /// Provider progress indicator, e.g. `"45%"`.
    pub progress: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::Generate.to_string(), "imagine");
        assert_eq!(Phase::Upscale.to_string(), "upscale");
    }

    #[test]
    fn upscale_job_copies_generation_identity() {
        let generation = GenerationResult {
            job_id: "1187".into(),
            content_hash: "9f2c".into(),
            flags: 64,
            preview_uri: None,
        };
        let job = UpscaleJob::for_candidate(&generation, 1);
        assert_eq!(job.candidate_index, 1);
        assert_eq!(job.job_id, "1187");
        assert_eq!(job.content_hash, "9f2c");
        assert_eq!(job.flags, 64);
    }
}
