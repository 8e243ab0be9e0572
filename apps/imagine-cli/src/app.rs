//! Application orchestrator: wires gateway, pipeline and fetcher together.

use std::path::{Path, PathBuf};

use anyhow::Context;
use imagine_asset_client::HttpTransport;
use imagine_gateway::{Credentials, GatewayClient, GatewayConfig};
use imagine_pipeline::{
    AssetFetcher, GenerateCapability, GenerationPipeline, LogReporter, ProgressReporter,
    RetryPolicy, RetryingTransport, Transport, UpscaleCapability, ensure_output_dir,
    format_output_path,
};

use crate::cli::Args;
use crate::config::Config;

/// Settings for one run, after command-line overrides.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub prompt: String,
    pub prefix: String,
    pub sequence: u64,
    pub dest: PathBuf,
    pub candidate: u8,
    pub generate_policy: RetryPolicy,
    pub upscale_policy: RetryPolicy,
    pub download_attempts: u32,
    pub strict_download: bool,
}

impl RunOptions {
    pub fn resolve(args: &Args, config: &Config) -> Self {
        let mut generate_policy = config.generate.policy();
        let mut upscale_policy = config.upscale.policy();
        if let Some(max) = args.max_attempts {
            generate_policy.max_attempts = Some(max.max(1));
            upscale_policy.max_attempts = Some(max.max(1));
        }

        Self {
            prompt: args.prompt.clone(),
            prefix: args.prefix.clone(),
            sequence: args.sequence,
            dest: args.dest.clone(),
            candidate: args.candidate.unwrap_or(config.candidate),
            generate_policy,
            upscale_policy,
            download_attempts: config.download_attempts.max(1),
            strict_download: args.strict_download,
        }
    }
}

fn gateway_config(args: &Args, config: &Config) -> anyhow::Result<GatewayConfig> {
    let credentials = Credentials {
        server_id: args.server_id.clone().unwrap_or_default(),
        channel_id: args.channel_id.clone().unwrap_or_default(),
        token: args.token.clone().unwrap_or_default(),
    };
    let missing = credentials.missing();
    if !missing.is_empty() {
        anyhow::bail!(
            "missing credentials: {} (set SERVER_ID, CHANNEL_ID and SALAI_TOKEN)",
            missing.join(", ")
        );
    }

    Ok(GatewayConfig {
        url: args
            .gateway_url
            .clone()
            .unwrap_or_else(|| config.gateway_url.clone()),
        credentials,
        client_name: config.client_name.clone(),
    })
}

/// Runs one prompt against the configured gateway.
pub async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let gateway = gateway_config(&args, &config)?;
    let options = RunOptions::resolve(&args, &config);

    ensure_output_dir(&options.dest)
        .with_context(|| format!("creating {}", options.dest.display()))?;

    let transport =
        RetryingTransport::with_attempts(HttpTransport::new()?, options.download_attempts);
    let fetcher = AssetFetcher::new(transport).on_complete(Box::new(|path: &Path| {
        println!("File saved to {}", path.display());
    }));

    let client = GatewayClient::connect(&gateway)
        .await
        .with_context(|| format!("connecting to gateway at {}", gateway.url))?;

    let result = execute(&client, &client, &fetcher, &options, &LogReporter).await;
    client.close().await;
    result.map(|_| ())
}

/// Runs the pipeline and saves the upscaled image.
///
/// Returns the saved path, or `None` when the download failed and
/// `strict_download` is off. The failure has already been logged then.
pub async fn execute<T: Transport>(
    generator: &dyn GenerateCapability,
    upscaler: &dyn UpscaleCapability,
    fetcher: &AssetFetcher<T>,
    options: &RunOptions,
    reporter: &dyn ProgressReporter,
) -> anyhow::Result<Option<PathBuf>> {
    let pipeline = GenerationPipeline::new(generator, upscaler)
        .with_generate_policy(options.generate_policy.clone())
        .with_upscale_policy(options.upscale_policy.clone())
        .with_candidate_index(options.candidate);

    let upscaled = pipeline.run(&options.prompt, reporter).await?;

    let path = format_output_path(&options.dest, &options.prefix, options.sequence);
    match fetcher.fetch(&upscaled.uri, &path).await {
        Ok(saved) => Ok(Some(saved)),
        Err(e) if options.strict_download => {
            Err(e).with_context(|| format!("saving {}", path.display()))
        }
        Err(_) => Ok(None),
    }
}
