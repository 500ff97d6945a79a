use clap::Parser;
use small_dashboard::core::ConfigProvider;
use small_dashboard::utils::error::ErrorSeverity;
use small_dashboard::utils::{logger, validation::Validate};
use small_dashboard::{CliConfig, DashboardEngine, HttpDataSource, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting small-dashboard CLI");
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

    let source = HttpDataSource::new(config.base_url(), config.request_timeout())?;
    let storage = LocalStorage::new(config.output_path.clone());
    let engine = DashboardEngine::new(source, storage, config);

    match engine.run().await {
        Ok(outcome) => {
            if let Some(error) = &outcome.error {
                eprintln!("⚠️ {}", error);
            }
            tracing::info!("✅ Dashboard rendered ({} charts)", outcome.charts_displayed);
            println!("✅ Dashboard rendered ({} charts)", outcome.charts_displayed);
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Dashboard render failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
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
