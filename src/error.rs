use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("missing required setting {flag}")]
    MissingSetting { flag: &'static str },

    #[error("could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("timed out after {timeout:?} connecting to {host}:{port}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    #[error("statement `{name}` failed: {source}")]
    Statement {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

pub type EtlResult<T> = Result<T, EtlError>;
