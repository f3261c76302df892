//! Route query construction and parsing.
//!
//! Stop pairs travel as two repeated keys, `start_node` and `end_node`, whose
//! elements are correlated by position. The query keeps pairs together so the
//! two arrays are always built from the same pass.

use crate::error::QueryError;
use crate::model::{Mode, RunParameters, StopPair};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const START_KEY: &str = "start_node";
const END_KEY: &str = "end_node";
const ANTS_KEY: &str = "num_ants";
const ITERATIONS_KEY: &str = "num_iterations";
const MODE_KEY: &str = "mode";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pairs: Vec<(String, String)>,
    params: Option<RunParameters>,
}

impl RouteQuery {
    pub fn build(pairs: &[StopPair], params: Option<&RunParameters>) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|p| (p.start.clone(), p.end.clone()))
                .collect(),
            params: params.cloned(),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn params(&self) -> Option<&RunParameters> {
        self.params.as_ref()
    }

    /// Serialize as `start_node=..&..&end_node=..&..[&num_ants=..&num_iterations=..&mode=..]`.
    ///
    /// Stop values are URI-component encoded; run parameters are appended verbatim.
    pub fn to_query_string(&self) -> String {
        let mut starts = Vec::with_capacity(self.pairs.len());
        let mut ends = Vec::with_capacity(self.pairs.len());
        for (start, end) in &self.pairs {
            starts.push(format!("{START_KEY}={}", urlencoding::encode(start)));
            ends.push(format!("{END_KEY}={}", urlencoding::encode(end)));
        }

        let mut parts = starts;
        parts.append(&mut ends);
        if let Some(p) = &self.params {
            parts.push(format!("{ANTS_KEY}={}", p.ant_count));
            parts.push(format!("{ITERATIONS_KEY}={}", p.iteration_count));
            parts.push(format!("{MODE_KEY}={}", p.mode));
        }
        parts.join("&")
    }

    /// Decode a query string the way the backend reads it.
    ///
    /// Run parameters are only returned when all three keys are present.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        let mut ants = None;
        let mut iterations = None;
        let mut mode = None;

        for part in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            match key {
                START_KEY => starts.push(decode(value)?),
                END_KEY => ends.push(decode(value)?),
                ANTS_KEY => ants = Some(value.to_string()),
                ITERATIONS_KEY => iterations = Some(value.to_string()),
                MODE_KEY => mode = Some(value.to_string()),
                other => tracing::trace!(key = other, "ignoring unknown query key"),
            }
        }

        if starts.len() != ends.len() {
            return Err(QueryError::MismatchedPairs {
                starts: starts.len(),
                ends: ends.len(),
            });
        }
        if starts.is_empty() {
            return Err(QueryError::Empty);
        }

        let params = match (ants, iterations, mode) {
            (Some(ant_count), Some(iteration_count), Some(mode)) => Some(RunParameters {
                ant_count,
                iteration_count,
                mode: Mode::new(mode),
            }),
            _ => None,
        };

        Ok(Self {
            pairs: starts.into_iter().zip(ends).collect(),
            params,
        })
    }
}

fn decode(value: &str) -> Result<String, QueryError> {
    urlencoding::decode(value)
        .map(Cow::into_owned)
        .map_err(|_| QueryError::Decode(value.to_string()))
}
