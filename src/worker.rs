use super::config::SourceConfig;
use super::db::Warehouse;
use super::error::{EtlError, EtlResult};
use super::queries::{
    copy_table_queries, create_table_queries, drop_table_queries, insert_table_queries,
    Statement, STAR_TABLES,
};
use std::time::Instant;
use tracing::{info, instrument};

/// Runs the fixed statement lists, in order, against a warehouse.
pub struct Worker<W> {
    warehouse: W,
    sources: SourceConfig,
}

impl<W: Warehouse> Worker<W> {
    pub fn new(warehouse: W, sources: SourceConfig) -> Self {
        Worker { warehouse, sources }
    }

    pub fn into_inner(self) -> W {
        self.warehouse
    }

    #[instrument(skip(self))]
    pub async fn drop_tables(&mut self) -> EtlResult<()> {
        self.run_statements(&drop_table_queries()).await
    }

    /// Drops every table, then creates it again empty.
    #[instrument(skip(self))]
    pub async fn create_tables(&mut self) -> EtlResult<()> {
        self.drop_tables().await?;
        self.run_statements(&create_table_queries()).await
    }

    /// Copies the song and log data from S3 into the staging tables.
    #[instrument(skip(self))]
    pub async fn load_staging_tables(&mut self) -> EtlResult<()> {
        let copies = copy_table_queries(&self.sources);
        self.run_statements(&copies).await
    }

    /// Fills the fact and dimension tables from staging.
    #[instrument(skip(self))]
    pub async fn insert_tables(&mut self) -> EtlResult<()> {
        self.run_statements(&insert_table_queries()).await
    }

    pub async fn run_etl(&mut self) -> EtlResult<()> {
        self.load_staging_tables().await?;
        self.insert_tables().await
    }

    /// Row counts of the star schema tables, in load order.
    pub async fn report(&mut self) -> EtlResult<Vec<(&'static str, i64)>> {
        let mut counts = Vec::with_capacity(STAR_TABLES.len());
        for table in STAR_TABLES {
            let rows = self
                .warehouse
                .count_rows(table)
                .await
                .map_err(|source| EtlError::Statement {
                    name: format!("count {}", table),
                    source,
                })?;
            info!(table, rows, "Row count");
            counts.push((table, rows));
        }
        Ok(counts)
    }

    async fn run_statements(&mut self, statements: &[Statement]) -> EtlResult<()> {
        for statement in statements {
            info!(statement = %statement.name, table = statement.table, "Executing");
            let started = Instant::now();
            let rows = self
                .warehouse
                .execute(&statement.sql)
                .await
                .map_err(|source| EtlError::Statement {
                    name: statement.name.clone(),
                    source,
                })?;
            info!(
                statement = %statement.name,
                rows,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Committed"
            );
        }
        Ok(())
    }
}
