use clap::Parser;
use small_dashboard::adapters::http::data_endpoint;
use small_dashboard::core::ConfigProvider;
use small_dashboard::utils::error::ErrorSeverity;
use small_dashboard::utils::{logger, validation::Validate};
use small_dashboard::{DashboardEngine, HttpDataSource, LabelMode, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-dashboard")]
#[command(about = "Dashboard renderer with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override archive setting from config
    #[arg(long)]
    archive: Option<bool>,

    /// Override label mode from config
    #[arg(long, value_enum)]
    label_mode: Option<LabelMode>,

    /// Dry run - show what would be rendered without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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
    let verbose = args.verbose || config.verbose_logging();
    if config.json_logging() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based dashboard renderer");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(archive) = args.archive {
        config.output.archive = Some(archive);
        tracing::info!("🔧 Archive overridden to: {}", archive);
    }
    if let Some(label_mode) = args.label_mode {
        config.render.label_mode = Some(label_mode);
        tracing::info!("🔧 Label mode overridden to: {:?}", label_mode);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be fetched or written");
        perform_dry_run(&config);
        return Ok(());
    }

    let source = HttpDataSource::new(config.base_url(), config.request_timeout())?;
    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = DashboardEngine::new(source, storage, config);

    match engine.run().await {
        Ok(outcome) => {
            if let Some(error) = &outcome.error {
                eprintln!("⚠️ {}", error);
            }
            println!("✅ Dashboard rendered ({} charts)", outcome.charts_displayed);
            println!("📁 Output saved to: {}", outcome.output_path);
            for file in &outcome.files {
                tracing::debug!("  wrote {}", file);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Dashboard render failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Dashboard: {}", config.dashboard.name);
    if let Some(description) = &config.dashboard.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {}", data_endpoint(config.base_url()));
    println!("  Output: {}", config.output_path());
    println!("  Label mode: {:?}", config.label_mode());

    let (width, height) = config.canvas_size();
    println!("  Canvas: {}x{}", width, height);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Data Source:");
    println!("  GET {}", data_endpoint(config.base_url()));
    match config.request_timeout() {
        Some(timeout) => println!("  Timeout: {:?}", timeout),
        None => println!("  Timeout: none"),
    }

    println!();
    println!("📊 Charts:");
    for chart in config.chart_configs() {
        println!(
            "  {:<16} {:<10} field '{}' -> \"{}\"",
            chart.id, chart.kind, chart.field, chart.label
        );
    }

    println!();
    println!("💾 Output:");
    println!("  Path: {}", config.output_path());
    println!("  Files: <chart-id>.svg, index.html, aggregations.json, aggregations.csv");
    if config.archive_enabled() {
        println!("  Archive: dashboard.zip");
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
