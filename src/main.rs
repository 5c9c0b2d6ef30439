use clap::Parser;
use panelsync::cli::Cli;
use panelsync::config::Settings;
use panelsync::core::SyncEngine;
use panelsync::panel::HttpPanel;
use panelsync::{logging, sources};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match Settings::resolve(cli) {
        Ok(settings) => settings,
        Err(e) => {
            // 日志系统还没起来，直接写标准错误
            eprintln!("配置错误: {e:#}");
            std::process::exit(1);
        }
    };

    logging::init(&settings.log);

    if let Err(e) = run(&settings).await {
        error!("同步失败: {e:#}");
        std::process::exit(1);
    }

    info!("Done");
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    let plan = sources::build_plan(&settings.pairs, settings.follow_symlinks)?;
    let panel = HttpPanel::new(
        &settings.panel_url,
        &settings.api_key,
        settings.proxy.as_deref(),
    )?;

    let engine = SyncEngine::new(&panel, settings.sync_options());
    let report = engine.run(&settings.servers, &plan).await?;

    info!(
        "同步完成: {} 台服务器, 上传 {} 个文件 (重试耗尽 {}), 处理归档 {} 个, 清理条目 {} 个, 耗时 {}s",
        report.servers,
        report.files_uploaded,
        report.uploads_exhausted,
        report.archives_processed,
        report.entries_cleaned,
        report.duration_secs()
    );
    Ok(())
}
