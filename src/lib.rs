//! Client side of an ant-colony route planner.
//!
//! Keeps the ordered list of bus stop pairs, turns it and the run parameters
//! into a `/generate_routes` request, and swaps the returned HTML fragment
//! into a render target. Stale responses are dropped by sequence number.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod params;
pub mod query;
pub mod render;
pub mod session;
pub mod stops;
pub mod transport;
#[cfg(feature = "tui")]
pub mod tui;

pub use error::{ParamError, QueryError, SessionError, StoreError, TransportError};
pub use model::{Endpoint, Fragment, Mode, RunParameters, SessionConfig, StopPair};
pub use query::RouteQuery;
pub use session::{Completion, CompletionOutcome, MapSession};
pub use stops::StopPairStore;
