use super::config::ClusterConfig;
use super::error::{EtlError, EtlResult};
use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, Executor, PgConnection};
use std::time::Duration;
use tracing::{debug, info};

/// The warehouse the pipeline sends its statements to.
#[async_trait]
pub trait Warehouse: Send {
    /// Runs `sql` in its own transaction and commits it, returning the number
    /// of rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error>;

    async fn count_rows(&mut self, table: &str) -> Result<i64, sqlx::Error>;
}

/// A single connection to a Redshift cluster.
pub struct Redshift {
    conn: PgConnection,
}

impl Redshift {
    pub async fn connect(config: &ClusterConfig) -> EtlResult<Self> {
        let options = config.connect_options()?;
        info!(host = options.get_host(), port = options.get_port(), db = %config.dbname, "Connecting to cluster");
        Self::connect_with(&options, config.connect_timeout()).await
    }

    pub async fn connect_with(options: &PgConnectOptions, timeout: Duration) -> EtlResult<Self> {
        let connecting = PgConnection::connect_with(options);
        match tokio::time::timeout(timeout, connecting).await {
            Ok(Ok(conn)) => Ok(Redshift { conn }),
            Ok(Err(source)) => Err(EtlError::Connect {
                host: options.get_host().to_string(),
                port: options.get_port(),
                source,
            }),
            Err(_) => Err(EtlError::ConnectTimeout {
                host: options.get_host().to_string(),
                port: options.get_port(),
                timeout,
            }),
        }
    }

    pub async fn close(self) -> Result<(), sqlx::Error> {
        debug!("Closing cluster connection");
        self.conn.close().await
    }
}

#[async_trait]
impl Warehouse for Redshift {
    async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error> {
        // COPY and DDL go through the simple query protocol; Redshift does not
        // prepare them.
        let mut tx = self.conn.begin().await?;
        let conn: &mut PgConnection = &mut tx;
        let result = Executor::execute(conn, sqlx::raw_sql(sql)).await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn count_rows(&mut self, table: &str) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut self.conn)
            .await
    }
}

/// Logs every statement and executes nothing.
#[derive(Default)]
pub struct DryRun {
    pub executed: usize,
}

#[async_trait]
impl Warehouse for DryRun {
    async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error> {
        self.executed += 1;
        info!(sql = sql.trim(), "Dry run, skipping");
        Ok(0)
    }

    async fn count_rows(&mut self, table: &str) -> Result<i64, sqlx::Error> {
        debug!(table, "Dry run, no rows to count");
        Ok(0)
    }
}

#[cfg(test)]
mod test {
    use super::{DryRun, Redshift, Warehouse};
    use sqlx::postgres::PgConnectOptions;
    use std::str::FromStr;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let mut warehouse = DryRun::default();
        assert_eq!(0, warehouse.execute("DROP TABLE IF EXISTS users").await.unwrap());
        assert_eq!(0, warehouse.execute("DROP TABLE IF EXISTS songs").await.unwrap());
        assert_eq!(0, warehouse.count_rows("users").await.unwrap());
        assert_eq!(2, warehouse.executed);
    }

    async fn connect_from_env() -> Redshift {
        let url = std::env::var("DWH_TEST_DATABASE_URL")
            .expect("DWH_TEST_DATABASE_URL must point at a scratch Postgres database");
        let options = PgConnectOptions::from_str(&url).expect("valid database url");
        Redshift::connect_with(&options, Duration::from_secs(10))
            .await
            .expect("connect to test database")
    }

    #[tokio::test]
    #[ignore = "needs DWH_TEST_DATABASE_URL"]
    async fn test_statements_commit_individually() {
        let mut warehouse = connect_from_env().await;
        warehouse
            .execute("DROP TABLE IF EXISTS etl_commit_check")
            .await
            .unwrap();
        warehouse
            .execute("CREATE TABLE etl_commit_check (id INTEGER NOT NULL)")
            .await
            .unwrap();
        let inserted = warehouse
            .execute("INSERT INTO etl_commit_check (id) VALUES (1)")
            .await
            .unwrap();
        assert_eq!(1, inserted);

        let failed = warehouse
            .execute("INSERT INTO etl_commit_check (id) VALUES (NULL)")
            .await;
        assert!(failed.is_err());
        warehouse.close().await.unwrap();

        let mut warehouse = connect_from_env().await;
        assert_eq!(1, warehouse.count_rows("etl_commit_check").await.unwrap());
        warehouse
            .execute("DROP TABLE etl_commit_check")
            .await
            .unwrap();
        warehouse.close().await.unwrap();
    }
}
