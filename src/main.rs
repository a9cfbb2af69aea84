use clap::Parser;
use slotwatch::config::CliArgs;
use slotwatch::utils::{logger, validation::Validate};
use slotwatch::{
    LocalStateStore, LocalTemplateStore, MonitorConfig, MonitorError, Notifier, SlotFetcher,
    SlotMonitorWorker, SmtpMailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_service_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting slotwatch");

    let config = match MonitorConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration {}: {}", args.config, e);
            eprintln!("❌ Failed to load configuration {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // 組裝監控 worker
    let templates = LocalTemplateStore::new(
        &config.templates.dir,
        config.header_file(),
        config.body_file(),
    );
    let state = LocalStateStore::new(
        &config.state.dir,
        config.horizon_file(),
        config.history_file(),
    );
    let mailer = SmtpMailer::new(&config.mail, config.smtp_port())?;
    let fetcher = SlotFetcher::new(
        templates,
        config.base_url().to_string(),
        config.request_timeout(),
    )?;
    let notifier = Notifier::new(mailer, config.notify_unavailability());
    let worker = SlotMonitorWorker::new(fetcher, state, notifier);

    if args.once {
        // 單次觸發模式：結果反映在退出碼，方便腳本化
        match worker.run_cycle().await {
            Ok(report) => {
                tracing::info!(
                    "✅ Cycle complete: {} slots seen, {} free, horizon {}{}",
                    report.slot_count,
                    report.free_count,
                    report.horizon.to_rfc3339(),
                    if report.horizon_extended {
                        " (extended)"
                    } else {
                        ""
                    }
                );
            }
            Err(e) => {
                report_cycle_failure(&e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    tracing::info!(
        "⏱️ Polling every {} minutes",
        config.poll_interval().as_secs() / 60
    );
    let mut ticker = tokio::time::interval(config.poll_interval());
    loop {
        ticker.tick().await;
        // 循環失敗只記錄原因鏈，排程本身不能跟著掛掉
        match worker.run_cycle().await {
            Ok(report) => {
                tracing::info!(
                    "✅ Cycle complete: {} slots seen, {} free, horizon {}",
                    report.slot_count,
                    report.free_count,
                    report.horizon.to_rfc3339()
                );
            }
            Err(e) => report_cycle_failure(&e),
        }
    }
}

fn report_cycle_failure(error: &MonitorError) {
    tracing::error!("❌ Monitoring cycle failed: {}", error);
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        tracing::error!("   caused by: {}", cause);
        source = cause.source();
    }
}
