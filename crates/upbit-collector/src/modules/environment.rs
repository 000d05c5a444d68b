//! 실행 환경 사전 점검.
//!
//! 배치 시작 전에 HTTP 클라이언트를 만들 수 있는지, DB 서버에 접속할 수
//! 있는지 확인합니다. 하나라도 실패하면 배치를 시작하지 않습니다.

use upbit_data::storage::candles::ping_server;
use upbit_data::UpbitClient;

use crate::error::CollectorError;
use crate::{CollectorConfig, Result};

/// 환경 점검을 수행하고, 성공하면 생성된 HTTP 클라이언트를 반환합니다.
pub async fn check_environment(config: &CollectorConfig) -> Result<UpbitClient> {
    let client = UpbitClient::new(config.upbit.clone()).map_err(|e| {
        CollectorError::Environment(format!("HTTP 클라이언트를 사용할 수 없습니다: {}", e))
    })?;
    tracing::debug!(base_url = %client.config().base_url, "HTTP 클라이언트 확인");

    ping_server(&config.database).await.map_err(|e| {
        CollectorError::Environment(format!(
            "MySQL 서버({}:{})에 연결할 수 없습니다: {}",
            config.database.host, config.database.port, e
        ))
    })?;
    tracing::debug!(host = %config.database.host, "MySQL 서버 연결 확인");

    tracing::info!("환경 점검 통과");
    Ok(client)
}
