//! Upbit 대시보드 서버.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use upbit_core::{init_logging, LogConfig};
use upbit_dashboard::{create_router, spawn_reload_task, AppState, DashboardConfig};
use upbit_data::CandleRepository;

#[derive(Parser)]
#[command(name = "upbit-dashboard")]
#[command(about = "Upbit candle and defect dashboards", long_about = None)]
#[command(version)]
struct Cli {
    /// 바인드 주소 (DASHBOARD_ADDR보다 우선)
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(LogConfig::for_binary(&cli.log_level))?;
    info!("Starting Upbit dashboard...");

    let mut config = DashboardConfig::from_env()?;
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }

    // 시작 시 연결 실패는 설정 문제로 보고 종료
    let repository = CandleRepository::connect(config.database.clone()).await?;

    let state = Arc::new(AppState::new(
        Arc::new(repository.clone()),
        config.since,
        Some(config.defect_csv_path.clone()),
    ));
    state.reload_all().await;

    let reload_handle = spawn_reload_task(state.clone(), config.refresh_interval);
    info!(
        interval_secs = config.refresh_interval.as_secs(),
        "데이터 재조회 태스크 시작"
    );

    let app = create_router(state);

    info!(addr = %config.addr, "Dashboard listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reload_handle.abort();
    repository.close().await;
    info!("Dashboard stopped");

    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, shutting down"),
        _ = terminate => warn!("Received SIGTERM, shutting down"),
    }
}
