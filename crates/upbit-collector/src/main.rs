//! Upbit 일봉 수집기 CLI.

use clap::{Parser, Subcommand};
use upbit_collector::modules::{check_environment, BatchOutcome, DailyIngest};
use upbit_collector::CollectorConfig;
use upbit_core::{init_logging, previous_day, LogConfig};
use upbit_data::{CandleRepository, FileWatermark, WatermarkStore};

#[derive(Parser)]
#[command(name = "upbit-collector")]
#[command(about = "Upbit daily candle collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 전일 일봉 수집 (기본 명령)
    Collect,

    /// 환경 사전 점검만 실행
    Check,

    /// 워터마크와 오늘 실행 시 건너뛸지 여부 출력
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(LogConfig::for_binary(&cli.log_level))?;

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        host = %config.database.host,
        database = %config.database.database,
        markets = config.markets.len(),
        "설정 로드 완료"
    );

    let today = chrono::Local::now().date_naive();

    match cli.command.unwrap_or(Commands::Collect) {
        Commands::Collect => {
            tracing::info!("Upbit 일봉 수집기 시작");

            let client = check_environment(&config).await?;
            let repository = CandleRepository::connect(config.database.clone()).await?;
            let watermark = FileWatermark::new(&config.ingest.watermark_path);

            let ingest = DailyIngest::from_config(client, repository.clone(), watermark, &config);
            let outcome = ingest.run(today).await;
            repository.close().await;

            match outcome? {
                BatchOutcome::Skipped { watermark } => {
                    tracing::info!(watermark = %watermark, "오늘은 이미 수집되었습니다");
                }
                BatchOutcome::Completed {
                    stats,
                    watermark_written,
                } => {
                    stats.log_summary("일봉 수집");
                    if !watermark_written {
                        tracing::warn!("워터마크가 갱신되지 않아 다음 실행에서 다시 수집합니다");
                    }
                }
            }

            tracing::info!("Upbit 일봉 수집기 종료");
        }
        Commands::Check => {
            check_environment(&config).await?;
            println!("환경 점검 통과");
        }
        Commands::Status => {
            let watermark = FileWatermark::new(&config.ingest.watermark_path);
            let yesterday = previous_day(today);

            match watermark.read().await? {
                Some(date) => {
                    println!("워터마크: {} ({})", date, watermark.path().display());
                    if date == yesterday {
                        println!("오늘 실행은 건너뜁니다");
                    } else {
                        println!("오늘 실행 시 {} 데이터를 수집합니다", yesterday);
                    }
                }
                None => {
                    println!("워터마크 없음 ({})", watermark.path().display());
                    println!("오늘 실행 시 {} 데이터를 수집합니다", yesterday);
                }
            }
        }
    }

    Ok(())
}
