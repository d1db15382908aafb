use clap::Parser;
use exam_duty::config::Command;
use exam_duty::core::Pipeline;
use exam_duty::utils::{logger, validation::Validate};
use exam_duty::{
    AllocError, AllocationEngine, CliConfig, DutyPipeline, LocalStorage, SeatPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting exam-duty CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::current_dir();
    let outcome = if matches!(config.command, Command::Seats(_)) {
        run(SeatPipeline::new(storage, config)).await
    } else {
        run(DutyPipeline::new(storage, config)).await
    };

    match outcome {
        Ok(output_path) => {
            tracing::info!("✅ Allocation completed successfully!");
            println!("✅ Allocation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Allocation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run<P: Pipeline>(pipeline: P) -> Result<String, AllocError> {
    AllocationEngine::new(pipeline).run().await
}
