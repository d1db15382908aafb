use clap::{Parser, ValueEnum};
use exam_duty::app::pipelines::{
    artifact_path, default_allocation_path, seat_output_formats, DUTY_ARTIFACT, SEAT_ARTIFACT,
};
use exam_duty::core::{ConfigProvider, Pipeline};
use exam_duty::utils::{logger, validation::Validate};
use exam_duty::{
    AllocError, AllocationEngine, DutyPipeline, LocalStorage, SeatPipeline, SelectionPolicy,
    TomlConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Phase {
    Seats,
    Duties,
    All,
}

#[derive(Parser)]
#[command(name = "toml-alloc")]
#[command(about = "Run seat allocation and duty scheduling from a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "exam-duty.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Which phase(s) to run
    #[arg(long, value_enum, default_value_t = Phase::All)]
    phase: Phase,

    /// Override duty.max_duties from config
    #[arg(long)]
    max_duties: Option<u32>,

    /// Override duty.selection from config
    #[arg(long)]
    selection: Option<SelectionPolicy>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = args.verbose || config.verbose();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based allocation run");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(duty) = config.duty.as_mut() {
        if let Some(max_duties) = args.max_duties {
            duty.max_duties = Some(max_duties);
            tracing::info!("🔧 max_duties overridden to: {}", max_duties);
        }
        if let Some(selection) = args.selection {
            duty.selection = Some(selection);
            tracing::info!("🔧 selection overridden to: {}", selection);
        }
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let run_seats = matches!(args.phase, Phase::Seats | Phase::All) && config.seating.is_some();
    let run_duties = matches!(args.phase, Phase::Duties | Phase::All) && config.duty.is_some();

    if !run_seats && !run_duties {
        eprintln!("❌ Phase '{:?}' is not configured in {}", args.phase, args.config);
        std::process::exit(1);
    }

    display_config_summary(&config, run_seats, run_duties);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config, run_seats, run_duties);
        return Ok(());
    }

    if run_seats {
        let pipeline = SeatPipeline::new(LocalStorage::current_dir(), config.clone());
        finish("Seat allocation", run(pipeline).await);
    }

    if run_duties {
        let pipeline = DutyPipeline::new(LocalStorage::current_dir(), config.clone());
        finish("Duty scheduling", run(pipeline).await);
    }

    Ok(())
}

async fn run<P: Pipeline>(pipeline: P) -> Result<String, AllocError> {
    AllocationEngine::new(pipeline).run().await
}

fn finish(phase: &str, outcome: Result<String, AllocError>) {
    match outcome {
        Ok(output_path) => {
            tracing::info!("✅ {} completed successfully!", phase);
            println!("✅ {} completed successfully!", phase);
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                phase,
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
}

fn display_config_summary(config: &TomlConfig, run_seats: bool, run_duties: bool) {
    println!("📋 Configuration Summary:");
    println!("  Run: {}", config.run.name);
    if let Some(description) = &config.run.description {
        println!("  Description: {}", description);
    }
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!("  Seat allocation: {}", if run_seats { "yes" } else { "no" });
    println!("  Duty scheduling: {}", if run_duties { "yes" } else { "no" });
    println!();
}

fn perform_dry_run(config: &TomlConfig, run_seats: bool, run_duties: bool) {
    println!("🔍 Dry Run Analysis:");

    if let (true, Some(request)) = (run_seats, config.seat_request()) {
        println!();
        println!("🪑 Seat Allocation:");
        println!("  Classrooms: {}", request.classrooms);
        println!("  Students: {}", request.students);
        println!("  Starting USN: {}", request.start_usn);
        for format in seat_output_formats(config.output_formats()) {
            println!(
                "  Writes: {}",
                artifact_path(config.output_path(), SEAT_ARTIFACT, &format)
            );
        }
    }

    if let (true, Some(request)) = (run_duties, config.duty_request()) {
        let policy = config.duty_policy();
        println!();
        println!("🧑‍🏫 Duty Scheduling:");
        println!("  Exam timetable: {}", request.exam_timetable);
        println!("  Faculty timetable: {}", request.faculty_timetable);
        println!(
            "  Classroom allocation: {}",
            request
                .allocation
                .unwrap_or_else(|| default_allocation_path(config.output_path()))
        );
        println!("  Max duties per faculty: {}", policy.max_duties);
        println!("  Selection: {}", policy.selection);
        for format in config.output_formats() {
            println!(
                "  Writes: {}",
                artifact_path(config.output_path(), DUTY_ARTIFACT, format)
            );
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
