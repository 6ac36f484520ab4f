#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use secret_santa::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use secret_santa::{
    ConsoleNotifier, DrawRequest, DrawSummary, LambdaConfig, S3Storage, SantaEngine, SnsNotifier,
};
#[cfg(feature = "lambda")]
use serde::Serialize;

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub participants: usize,
    pub attempts: usize,
    pub messages_sent: usize,
    pub dry_run: bool,
}

#[cfg(feature = "lambda")]
impl From<DrawSummary> for Response {
    fn from(summary: DrawSummary) -> Self {
        Self {
            message: "Secret Santa draw completed successfully".to_string(),
            participants: summary.participants,
            attempts: summary.attempts,
            messages_sent: summary.messages_sent,
            dry_run: summary.dry_run,
        }
    }
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<DrawRequest>) -> Result<Response, Error> {
    tracing::info!("Starting Secret Santa Lambda function");

    let mut config = LambdaConfig::from_env();
    config.apply_request(&event.payload);
    config
        .validate()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    let bucket = config
        .bucket()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?
        .to_string();

    // 建立 S3 客戶端
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .region(Region::new(config.settings.region.clone()))
        .build();
    let storage = S3Storage::new(S3Client::from_conf(s3_config), bucket);

    let result = if config.settings.dry_run {
        SantaEngine::new(storage, ConsoleNotifier::stdout(), config)
            .run()
            .await
    } else {
        let notifier = SnsNotifier::from_region(
            &config.settings.region,
            config.settings.sender_id.clone(),
        )
        .await;
        SantaEngine::new(storage, notifier, config).run().await
    };
    let summary = result.map_err(|e| {
        tracing::error!("❌ Draw failed: {} (exit code {})", e, e.exit_code());
        Box::new(e) as Box<dyn std::error::Error + Send + Sync>
    })?;

    tracing::info!("Secret Santa Lambda function completed successfully");
    Ok(Response::from(summary))
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
