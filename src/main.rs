// ==========================================
// 制造台账系统 - 命令行入口
// ==========================================
// 协议: 标准输入每行一条 JSON 请求，标准输出每行一条 JSON 应答
// 日志: 写到标准错误
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use factory_ledger::api::Envelope;
use factory_ledger::app::{dispatch_json, AppState};
use factory_ledger::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    factory_ledger::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", factory_ledger::APP_NAME);
    tracing::info!("系统版本: {}", factory_ledger::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env();
    tracing::info!("使用数据库: {}", config.db_path);

    let state = AppState::new(config)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;
    let state = Arc::new(state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("读取标准输入失败")? {
        let raw = line.trim().to_string();
        if raw.is_empty() {
            continue;
        }

        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("request", %request_id);
        let worker_state = Arc::clone(&state);

        // 数据库访问是阻塞的，放到阻塞线程池执行
        let response = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            dispatch_json(&worker_state, &raw)
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(%request_id, error = %e, "请求处理任务异常");
            Envelope::fail(format!("任务执行失败: {}", e)).to_value()
        });

        let mut out = serde_json::to_string(&response).context("应答序列化失败")?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("标准输入已关闭，退出");
    Ok(())
}
