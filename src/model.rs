use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Name of the page region the backend fragments are rendered into.
pub const DEFAULT_RENDER_TARGET: &str = "map-container";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_url: String,
    pub user_agent: String,
    /// No timeout when `None`; a request may then stay pending indefinitely.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub initial_stops: Vec<(String, String)>,
    pub mode_options: Vec<String>,
    #[serde(default)]
    pub selected_mode: Option<String>,
    #[serde(default)]
    pub fallback_mode: Option<String>,
    pub ant_count: String,
    pub iteration_count: String,
    /// Reduced variant (stops only) when false.
    pub include_run_parameters: bool,
    pub render_target: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            user_agent: format!("route-planner/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
            initial_stops: Vec::new(),
            mode_options: vec!["fastest".into(), "shortest".into()],
            selected_mode: None,
            fallback_mode: None,
            ant_count: "10".into(),
            iteration_count: "10".into(),
            include_run_parameters: true,
            render_target: DEFAULT_RENDER_TARGET.into(),
        }
    }
}

/// One origin/destination row of the planning form.
///
/// `id` is positional and only used for display; rows are addressed by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPair {
    pub id: u64,
    pub start: String,
    pub end: String,
}

impl StopPair {
    pub fn empty(id: u64) -> Self {
        Self {
            id,
            start: String::new(),
            end: String::new(),
        }
    }
}

/// Opaque run strategy token, forwarded to the backend as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Auxiliary run configuration read from the input controls for one recompute.
///
/// Counts are kept as the raw text of the inputs; malformed values go to the
/// backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    pub ant_count: String,
    pub iteration_count: String,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// Default stop layout.
    Stops,
    /// Routes for the current stop pairs.
    Routes,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Stops => "/generate_stops",
            Endpoint::Routes => "/generate_routes",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// HTML payload returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub body: String,
}

impl Fragment {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeOption {
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub name: String,
    pub content: String,
    /// Sequence number of the request whose fragment is displayed.
    pub rendered_seq: Option<u64>,
    #[serde(default)]
    pub rendered_at: Option<String>,
}

impl RenderTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub seq: u64,
    pub endpoint: Endpoint,
    pub message: String,
}

/// Everything a presentation layer needs to draw the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub stops: Vec<StopPair>,
    pub ant_count: String,
    pub iteration_count: String,
    pub modes: Vec<ModeOption>,
    pub include_run_parameters: bool,
    pub target: RenderTarget,
    pub in_flight: usize,
    pub latest_seq: u64,
    pub last_error: Option<RequestFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Snapshot {
        // Boxed to keep the event small; views carry the whole fragment.
        view: Box<SessionView>,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    RequestIssued { seq: u64, endpoint: Endpoint },
    Rendered { seq: u64, endpoint: Endpoint },
    StaleDiscarded { seq: u64, latest: u64 },
    RequestFailed { seq: u64, endpoint: Endpoint, error: String },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::RequestIssued { seq, endpoint } => {
                format!("Request #{seq} sent to {endpoint}")
            }
            InfoEvent::Rendered { seq, endpoint } => {
                format!("Rendered #{seq} from {endpoint}")
            }
            InfoEvent::StaleDiscarded { seq, latest } => {
                format!("Discarded stale response #{seq} (latest is #{latest})")
            }
            InfoEvent::RequestFailed {
                seq,
                endpoint,
                error,
            } => format!("Request #{seq} to {endpoint} failed: {error}"),
        }
    }
}
