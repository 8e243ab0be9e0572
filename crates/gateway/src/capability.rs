//! Pipeline capabilities backed by a gateway session.

use tracing::warn;

use imagine_pipeline::{
    CapabilityError, CapabilityFuture, GenerateCapability, GenerationResult, ProgressHandle,
    UpscaleCapability, UpscaleJob, UpscaleResult,
};
use imagine_protocol::constants::MessageType;
use imagine_protocol::messages::{ImagineRequest, JobResult, UpscaleRequest};

use crate::ws_client::{GatewayClient, GatewayError};

impl From<GatewayError> for CapabilityError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Ws(_) | GatewayError::Closed | GatewayError::Timeout => {
                CapabilityError::Connection(err.to_string())
            }
            GatewayError::Rejected { .. } => CapabilityError::Rejected(err.to_string()),
            GatewayError::Json(_) | GatewayError::Handshake(_) | GatewayError::Protocol(_) => {
                CapabilityError::Protocol(err.to_string())
            }
        }
    }
}

impl GenerateCapability for GatewayClient {
    fn imagine<'a>(
        &'a self,
        prompt: &'a str,
        progress: &'a ProgressHandle<'a>,
    ) -> CapabilityFuture<'a, GenerationResult> {
        Box::pin(async move {
            let request = ImagineRequest {
                prompt: prompt.to_string(),
            };
            let result = self
                .run_job(MessageType::Imagine, &request, progress)
                .await?;
            Ok(result.map(generation_result))
        })
    }
}

impl UpscaleCapability for GatewayClient {
    fn upscale<'a>(
        &'a self,
        job: &'a UpscaleJob,
        progress: &'a ProgressHandle<'a>,
    ) -> CapabilityFuture<'a, UpscaleResult> {
        Box::pin(async move {
            let request = UpscaleRequest {
                index: job.candidate_index,
                msg_id: job.job_id.clone(),
                hash: job.content_hash.clone(),
                flags: job.flags,
            };
            let result = self
                .run_job(MessageType::Upscale, &request, progress)
                .await?;
            Ok(result.and_then(upscale_result))
        })
    }
}

fn generation_result(job: JobResult) -> GenerationResult {
    GenerationResult {
        job_id: job.id,
        content_hash: job.hash,
        flags: job.flags,
        preview_uri: (!job.uri.is_empty()).then_some(job.uri),
    }
}

// Nothing to download without a URI.
fn upscale_result(job: JobResult) -> Option<UpscaleResult> {
    if job.uri.is_empty() {
        warn!(id = %job.id, "upscale result without uri, treating as empty");
        return None;
    }
    Some(UpscaleResult { uri: job.uri })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(uri: &str) -> JobResult {
        JobResult {
            id: "1122334455".into(),
            uri: uri.into(),
            hash: "9f8e7d".into(),
            content: "a red fox".into(),
            flags: 4,
        }
    }

    #[test]
    fn generation_result_keeps_upscale_inputs() {
        let result = generation_result(job("https://cdn.example.com/grid.png"));
        assert_eq!(result.job_id, "1122334455");
        assert_eq!(result.content_hash, "9f8e7d");
        assert_eq!(result.flags, 4);
        assert_eq!(
            result.preview_uri.as_deref(),
            Some("https://cdn.example.com/grid.png")
        );

        assert_eq!(generation_result(job("")).preview_uri, None);
    }

    #[test]
    fn upscale_result_requires_uri() {
        assert!(upscale_result(job("")).is_none());
        assert_eq!(
            upscale_result(job("https://cdn.example.com/u.png")).unwrap().uri,
            "https://cdn.example.com/u.png"
        );
    }

    #[test]
    fn missing_uri_is_no_preview_and_no_upscale() {
        let wire: JobResult =
            serde_json::from_str(r#"{"id":"1187","hash":"abc","flags":0}"#).unwrap();

        let generated = generation_result(wire.clone());
        assert_eq!(generated.job_id, "1187");
        assert_eq!(generated.preview_uri, None);

        assert!(upscale_result(wire).is_none());
    }

    #[test]
    fn gateway_errors_map_to_capability_errors() {
        assert!(matches!(
            CapabilityError::from(GatewayError::Closed),
            CapabilityError::Connection(_)
        ));
        assert!(matches!(
            CapabilityError::from(GatewayError::Timeout),
            CapabilityError::Connection(_)
        ));
        assert!(matches!(
            CapabilityError::from(GatewayError::Protocol("x".into())),
            CapabilityError::Protocol(_)
        ));
        assert!(matches!(
            CapabilityError::from(GatewayError::Rejected {
                code: 403,
                message: "forbidden".into()
            }),
            CapabilityError::Rejected(_)
        ));
    }
}
