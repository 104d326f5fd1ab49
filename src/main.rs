use std::path::PathBuf;
use std::process::ExitCode;

use sivpilot_export::{logger, App, Config};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::init(false);
            error!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化日志
    logger::init(config.verbose_logging);

    // 用法: sivpilot-export [case.json]
    let case_path = std::env::args_os().nth(1).map(PathBuf::from);

    let app = match App::initialize(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("❌ 初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match app.run(case_path.as_deref()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
