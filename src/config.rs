//! Command line and environment configuration.
//!
//! Every flag can also be supplied through a `DWH_*` environment variable,
//! and `main` loads a `.env` file before parsing.

use super::error::{EtlError, EtlResult};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

/// Load songplay event data from S3 into a Redshift star schema.
#[derive(Parser, Debug, Clone)]
#[command(name = "songplay_etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub cluster: ClusterConfig,

    #[command(flatten)]
    pub sources: SourceConfig,

    /// Log statements instead of executing them against the warehouse
    #[arg(long, global = true, env = "DWH_DRY_RUN")]
    pub dry_run: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "DWH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drop and recreate the staging and star schema tables
    CreateTables,
    /// Copy S3 data into staging and populate the star schema
    Etl,
    /// create-tables followed by etl on a single connection
    Run,
    /// Log row counts of the star schema tables
    Report,
}

#[derive(Args, Debug, Clone)]
pub struct ClusterConfig {
    /// Cluster endpoint host
    #[arg(long, env = "DWH_HOST")]
    pub host: Option<String>,

    /// Database name
    #[arg(long, env = "DWH_DB_NAME", default_value = "dev")]
    pub dbname: String,

    /// Database user
    #[arg(long, env = "DWH_DB_USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "DWH_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database port
    #[arg(long, env = "DWH_PORT", default_value_t = 5439)]
    pub port: u16,

    /// Seconds to wait for the cluster to accept a connection
    #[arg(long, env = "DWH_CONNECT_TIMEOUT", default_value_t = 30)]
    pub connect_timeout_secs: u64,
}

impl ClusterConfig {
    /// Connection settings for the cluster. Host, user and password are only
    /// required here, so a dry run can go without them.
    pub fn connect_options(&self) -> EtlResult<PgConnectOptions> {
        Ok(PgConnectOptions::new()
            .host(required(&self.host, "--host")?)
            .port(self.port)
            .username(required(&self.user, "--user")?)
            .password(required(&self.password, "--password")?)
            .database(&self.dbname))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn required<'a>(value: &'a Option<String>, flag: &'static str) -> EtlResult<&'a str> {
    value
        .as_deref()
        .ok_or(EtlError::MissingSetting { flag })
}

#[derive(Args, Debug, Clone)]
pub struct SourceConfig {
    /// S3 prefix holding the event log files
    #[arg(long, env = "DWH_LOG_DATA", default_value = "s3://udacity-dend/log_data")]
    pub log_data: String,

    /// JSONPaths file describing the event log layout
    #[arg(
        long,
        env = "DWH_LOG_JSONPATH",
        default_value = "s3://udacity-dend/log_json_path.json"
    )]
    pub log_jsonpath: String,

    /// S3 prefix holding the song metadata files
    #[arg(long, env = "DWH_SONG_DATA", default_value = "s3://udacity-dend/song_data")]
    pub song_data: String,

    /// IAM role the cluster assumes to read from S3
    #[arg(long = "iam-role-arn", env = "DWH_IAM_ROLE_ARN")]
    pub iam_role_arn: String,

    /// Region of the source bucket, when it differs from the cluster's
    #[arg(long, env = "DWH_S3_REGION")]
    pub region: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    const REQUIRED: [&str; 8] = [
        "songplay_etl",
        "--host",
        "dwh.example.us-west-2.redshift.amazonaws.com",
        "--user",
        "dwhuser",
        "--password",
        "secret",
        "--iam-role-arn=arn:aws:iam::123456789012:role/dwhRole",
    ];

    fn parse(extra: &[&str]) -> Cli {
        let args = REQUIRED.iter().chain(extra.iter()).copied();
        Cli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["etl"]);
        assert_eq!(Command::Etl, cli.command);
        assert_eq!(5439, cli.cluster.port);
        assert_eq!("dev", cli.cluster.dbname);
        assert_eq!(Duration::from_secs(30), cli.cluster.connect_timeout());
        assert_eq!("s3://udacity-dend/log_data", cli.sources.log_data);
        assert_eq!("s3://udacity-dend/song_data", cli.sources.song_data);
        assert_eq!(None, cli.sources.region);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_subcommands_and_global_flags() {
        let cli = parse(&["create-tables", "--dry-run"]);
        assert_eq!(Command::CreateTables, cli.command);
        assert!(cli.dry_run);

        assert_eq!(Command::Run, parse(&["run"]).command);
        assert_eq!(Command::Report, parse(&["report"]).command);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&["--port", "5432", "--dbname", "sparkify", "--region", "us-west-2", "run"]);
        assert_eq!(5432, cli.cluster.port);
        assert_eq!("sparkify", cli.cluster.dbname);
        assert_eq!(Some("us-west-2".to_string()), cli.sources.region);
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(REQUIRED).is_err());
    }

    #[test]
    fn test_connect_options() {
        let cli = parse(&["etl"]);
        let options = cli.cluster.connect_options().unwrap();
        assert_eq!("dwh.example.us-west-2.redshift.amazonaws.com", options.get_host());
        assert_eq!(5439, options.get_port());
        assert_eq!("dwhuser", options.get_username());
        assert_eq!(Some("dev"), options.get_database());
    }

    #[test]
    fn test_dry_run_needs_no_credentials() {
        let cli = Cli::try_parse_from([
            "songplay_etl",
            "--iam-role-arn=arn:aws:iam::123456789012:role/dwhRole",
            "--dry-run",
            "run",
        ])
        .expect("dry run without cluster credentials");
        assert!(cli.dry_run);
        assert_eq!(None, cli.cluster.host);

        match cli.cluster.connect_options() {
            Err(EtlError::MissingSetting { flag }) => assert_eq!("--host", flag),
            other => panic!("expected missing host, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_password_is_reported_on_connect() {
        let cli = Cli::try_parse_from([
            "songplay_etl",
            "--host",
            "localhost",
            "--user",
            "dwhuser",
            "--iam-role-arn=arn:aws:iam::123456789012:role/dwhRole",
            "etl",
        ])
        .expect("password is optional at parse time");
        let err = cli.cluster.connect_options().unwrap_err();
        assert_eq!("missing required setting --password", err.to_string());
    }
}
