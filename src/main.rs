use cert_verify::core::ConfigProvider;
use cert_verify::domain::model::OverallVerdict;
use cert_verify::utils::error::ErrorSeverity;
use cert_verify::utils::{logger, validation::Validate};
use cert_verify::{build_engine, load_document, CliConfig, LocalStorage, VerificationReport};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // Logging
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting cert-verify CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // Effective configuration
    let config = match cli.effective_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let storage = LocalStorage::new(".".to_string(), config.max_document_bytes());
    let document = match load_document(&storage, &cli.document).await {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(
                "❌ Could not load {}: {} (Category: {:?}, Severity: {:?})",
                cli.document,
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    };

    let engine = build_engine(&config);
    let report = engine.run(&document).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    // 0 valid, 1 could not process, 2 inconclusive, 4 fake
    let exit_code = match &report {
        VerificationReport::Failed { .. } => 1,
        VerificationReport::Completed(outcome) => match outcome.verdict.overall {
            OverallVerdict::Valid => 0,
            OverallVerdict::Inconclusive => 2,
            OverallVerdict::Fake => 4,
        },
    };
    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}
