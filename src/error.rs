//! Error types for the route planner client.
//!
//! Each layer has its own enum; the session wraps the ones it can surface
//! before a request is issued.

use crate::model::Endpoint;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no stop pair at row {index} (have {len})")]
    NoSuchStop { index: usize, len: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("no mode selected")]
    NoModeSelected,

    #[error("unknown mode '{0}'")]
    UnknownMode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("{starts} start_node values but {ends} end_node values")]
    MismatchedPairs { starts: usize, ends: usize },

    #[error("query has no stop pairs")]
    Empty,

    #[error("could not decode '{0}'")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
