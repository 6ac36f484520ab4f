use clap::error::ErrorKind;
use clap::Parser;
use secret_santa::core::Notifier;
use secret_santa::utils::{logger, validation::Validate};
use secret_santa::{
    CliConfig, ConsoleNotifier, DrawSummary, LocalStorage, Result, SantaEngine, SantaError,
    Settings,
};

#[tokio::main]
async fn main() {
    let cli = match CliConfig::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            // 參數錯誤屬於配置錯誤
            _ => {
                let _ = e.print();
                std::process::exit(
                    SantaError::ConfigError {
                        message: e.to_string(),
                    }
                    .exit_code(),
                );
            }
        },
    };

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    // 初始化日誌
    if let Err(e) = logger::init_cli_logger(
        settings.verbose,
        &settings.log_level,
        settings.log_file.as_deref(),
    ) {
        exit_with(&e);
    }

    tracing::info!("Starting secret-santa CLI");
    if settings.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let result = if settings.dry_run {
        tracing::info!("DRY RUN MODE - No SMS messages will be sent");
        println!("\n=== DRY RUN MODE ===\n");
        run_draw(settings, ConsoleNotifier::stdout()).await
    } else {
        send_for_real(settings).await
    };

    match result {
        Ok(summary) => {
            if summary.dry_run {
                println!(
                    "✅ Dry run completed. {} messages would have been sent.",
                    summary.messages_sent
                );
            } else {
                println!(
                    "✅ Secret Santa draw completed, {} messages sent.",
                    summary.messages_sent
                );
            }
        }
        Err(e) => {
            tracing::error!("❌ Draw failed: {} (Category: {:?})", e, e.category());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            exit_with(&e);
        }
    }
}

async fn run_draw<N: Notifier>(settings: Settings, notifier: N) -> Result<DrawSummary> {
    SantaEngine::new(LocalStorage::default(), notifier, settings)
        .run()
        .await
}

#[cfg(feature = "sns")]
async fn send_for_real(settings: Settings) -> Result<DrawSummary> {
    let notifier =
        secret_santa::SnsNotifier::from_region(&settings.region, settings.sender_id.clone()).await;
    run_draw(settings, notifier).await
}

#[cfg(not(feature = "sns"))]
async fn send_for_real(_settings: Settings) -> Result<DrawSummary> {
    Err(SantaError::ConfigError {
        message: "built without SMS support, rebuild with the 'sns' feature or use --dry-run"
            .to_string(),
    })
}

fn exit_with(e: &SantaError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
