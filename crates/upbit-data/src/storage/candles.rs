//! MySQL 일봉 테이블 저장소.
//!
//! # 동작 방식
//!
//! 1. `ensure_schema`로 데이터베이스와 테이블을 멱등하게 생성
//! 2. `insert_ignore`로 레코드 하나당 트랜잭션 하나씩 삽입
//! 3. (date, code) UNIQUE 제약이 중복 행을 막고, 기존 값은 절대 갱신하지 않음
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! let repo = CandleRepository::connect(DatabaseConfig::default()).await?;
//! repo.ensure_schema().await?;
//! let inserted = repo.insert_ignore(&record).await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;
use tracing::{debug, info, instrument};
use upbit_core::{CandleRecord, PriceRow};

use crate::error::{DataError, Result};
use crate::traits::CandleStore;

/// 기본 테이블 이름.
pub const DEFAULT_TABLE: &str = "upbit_data";

/// 데이터베이스 접속 설정.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
    /// 연결 타임아웃
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            table: DEFAULT_TABLE.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseConfig {
    /// `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `UPBIT_TABLE` 키로
    /// 설정을 읽습니다. 사용자/비밀번호/데이터베이스 이름은 필수입니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                DataError::Config(format!("{} 환경변수가 설정되지 않았습니다", key))
            })
        };

        let defaults = Self::default();
        let config = Self {
            host: get("DB_HOST").unwrap_or(defaults.host),
            port: get("DB_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            user: required("DB_USER")?,
            // 비밀번호는 빈 값도 허용
            password: lookup("DB_PASSWORD").ok_or_else(|| {
                DataError::Config("DB_PASSWORD 환경변수가 설정되지 않았습니다".to_string())
            })?,
            database: required("DB_NAME")?,
            table: get("UPBIT_TABLE").unwrap_or(defaults.table),
            connect_timeout: defaults.connect_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// 데이터베이스/테이블 이름이 쿼리에 그대로 들어갈 수 있는지 확인합니다.
    pub fn validate(&self) -> Result<()> {
        if self.user.is_empty() {
            return Err(DataError::Config("DB 사용자 이름이 비어 있습니다".to_string()));
        }
        validate_identifier("database", &self.database)?;
        validate_identifier("table", &self.table)
    }

    /// 데이터베이스를 지정하지 않은 서버 접속 옵션.
    pub fn server_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
    }

    /// 데이터베이스 접속 옵션.
    pub fn database_options(&self) -> MySqlConnectOptions {
        self.server_options().database(&self.database)
    }
}

/// SQL 식별자로 쓸 수 있는 이름인지 확인 (영숫자와 `_`, 최대 64자).
fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DataError::Config(format!("잘못된 {} 이름: '{}'", kind, name)))
    }
}

/// 테이블 생성 DDL.
fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS `{table}` (
            id INT AUTO_INCREMENT PRIMARY KEY,
            date DATE NOT NULL,
            code VARCHAR(20) NOT NULL,
            opening_price DOUBLE NOT NULL,
            closing_price DOUBLE NOT NULL,
            high_price DOUBLE NOT NULL,
            low_price DOUBLE NOT NULL,
            volume DOUBLE NOT NULL,
            prev_closing_price DOUBLE NOT NULL,
            UNIQUE (date, code)
        )
        "#
    )
}

fn insert_ignore_sql(table: &str) -> String {
    format!(
        r#"
        INSERT IGNORE INTO `{table}`
            (date, code, opening_price, closing_price, high_price, low_price, volume, prev_closing_price)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#
    )
}

fn select_since_sql(table: &str) -> String {
    format!(
        r#"
        SELECT date, code, opening_price, closing_price, prev_closing_price, volume
        FROM `{table}`
        WHERE date >= ?
        ORDER BY date ASC, code ASC
        "#
    )
}

/// 서버 접속 가능 여부를 확인합니다 (데이터베이스 미지정).
pub async fn ping_server(config: &DatabaseConfig) -> Result<()> {
    let mut conn = config
        .server_options()
        .connect()
        .await
        .map_err(|e| DataError::Connection(e.to_string()))?;
    conn.ping().await?;
    conn.close().await?;
    Ok(())
}

/// 일봉 테이블 저장소.
#[derive(Clone)]
pub struct CandleRepository {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl CandleRepository {
    /// 데이터베이스가 없으면 만든 뒤 연결 풀을 생성합니다.
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        create_database_if_not_exists(&config).await?;

        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(config.connect_timeout)
            .connect_with(config.database_options())
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        info!(
            host = %config.host,
            database = %config.database,
            table = %config.table,
            "데이터베이스 연결 성공"
        );

        Ok(Self { pool, config })
    }

    /// 기존 연결 풀로 저장소를 생성합니다. 데이터베이스는 이미 있어야 합니다.
    pub fn with_pool(pool: MySqlPool, config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { pool, config })
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// 테이블이 없으면 생성합니다.
    #[instrument(skip(self), fields(table = %self.config.table))]
    pub async fn create_table_if_not_exists(&self) -> Result<()> {
        sqlx::query(&create_table_sql(&self.config.table))
            .execute(&self.pool)
            .await?;
        debug!("테이블 확인 완료");
        Ok(())
    }

    /// 레코드 하나를 자체 트랜잭션으로 삽입합니다.
    ///
    /// 이미 (date, code)가 있으면 기존 값을 유지하고 `false`를 반환합니다.
    pub async fn insert_record(&self, record: &CandleRecord) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(&insert_ignore_sql(&self.config.table))
            .bind(record.date)
            .bind(&record.code)
            .bind(record.opening_price)
            .bind(record.closing_price)
            .bind(record.high_price)
            .bind(record.low_price)
            .bind(record.volume)
            .bind(record.prev_closing_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::Insert(e.to_string()))?;

        tx.commit().await?;

        Ok(result.rows_affected() == 1)
    }

    /// `since` 이후의 모든 행을 날짜순으로 조회합니다.
    pub async fn load_since(&self, since: NaiveDate) -> Result<Vec<PriceRow>> {
        let rows: Vec<PriceRow> = sqlx::query_as(&select_since_sql(&self.config.table))
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        debug!(since = %since, rows = rows.len(), "일봉 데이터 조회");
        Ok(rows)
    }

    /// (date, code) 행 하나를 조회합니다.
    pub async fn find(&self, date: NaiveDate, code: &str) -> Result<Option<CandleRecord>> {
        let sql = format!(
            "SELECT date, code, opening_price, closing_price, high_price, low_price, volume, prev_closing_price \
             FROM `{}` WHERE date = ? AND code = ?",
            self.config.table
        );
        let record = sqlx::query_as(&sql)
            .bind(date)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// 마켓별 행 수.
    pub async fn count_by_code(&self, code: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM `{}` WHERE code = ?", self.config.table);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// 연결 확인.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// 서버 연결로 데이터베이스를 생성합니다.
async fn create_database_if_not_exists(config: &DatabaseConfig) -> Result<()> {
    let mut conn = config
        .server_options()
        .connect()
        .await
        .map_err(|e| DataError::Connection(e.to_string()))?;

    sqlx::query(&format!(
        "CREATE DATABASE IF NOT EXISTS `{}`",
        config.database
    ))
    .execute(&mut conn)
    .await?;

    conn.close().await?;
    Ok(())
}

#[async_trait]
impl CandleStore for CandleRepository {
    async fn ensure_schema(&self) -> Result<()> {
        create_database_if_not_exists(&self.config).await?;
        self.create_table_if_not_exists().await
    }

    async fn insert_ignore(&self, record: &CandleRecord) -> Result<bool> {
        self.insert_record(record).await
    }
}
