//! Map session: ties the stop list, run controls, transport and renderer together.
//!
//! Requests run as spawned tasks and report back on the completion channel
//! handed to [`MapSession::new`]. The owner of the session feeds each
//! [`Completion`] into [`MapSession::complete`]; all state changes happen there.

use crate::error::{SessionError, StoreError, TransportError};
use crate::model::{
    Endpoint, Fragment, Mode, RequestFailure, SessionConfig, SessionView, StopPair,
};
use crate::params::{MissingMode, ModeSelector, ParameterCollector, RunControls};
use crate::query::RouteQuery;
use crate::render::{FragmentRenderer, RenderOutcome};
use crate::stops::StopPairStore;
use crate::transport::RouteClient;
use tokio::sync::mpsc::UnboundedSender;

/// A finished request, delivered exactly once per issued sequence number.
#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub endpoint: Endpoint,
    pub result: Result<Fragment, TransportError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Rendered { seq: u64, endpoint: Endpoint },
    Stale { seq: u64, latest: u64 },
    /// The target was left as it was.
    Failed(RequestFailure),
}

pub struct MapSession {
    client: RouteClient,
    stops: StopPairStore,
    controls: RunControls,
    collector: ParameterCollector,
    include_run_parameters: bool,
    renderer: FragmentRenderer,
    in_flight: usize,
    last_error: Option<RequestFailure>,
    completion_tx: UnboundedSender<Completion>,
}

impl MapSession {
    pub fn new(
        cfg: &SessionConfig,
        completion_tx: UnboundedSender<Completion>,
    ) -> Result<Self, SessionError> {
        let client = RouteClient::new(cfg)?;

        let mut mode = ModeSelector::new(cfg.mode_options.iter().cloned());
        if let Some(selected) = cfg.selected_mode.as_deref() {
            mode.select(selected)?;
        }
        let missing_mode = match cfg.fallback_mode.as_deref() {
            Some(token) => MissingMode::Fallback(Mode::new(token)),
            None => MissingMode::Reject,
        };

        Ok(Self {
            client,
            stops: StopPairStore::from_pairs(cfg.initial_stops.iter().cloned()),
            controls: RunControls {
                ant_count: cfg.ant_count.clone(),
                iteration_count: cfg.iteration_count.clone(),
                mode,
            },
            collector: ParameterCollector::new(missing_mode),
            include_run_parameters: cfg.include_run_parameters,
            renderer: FragmentRenderer::new(cfg.render_target.clone()),
            in_flight: 0,
            last_error: None,
            completion_tx,
        })
    }

    pub fn client(&self) -> &RouteClient {
        &self.client
    }

    pub fn stops(&self) -> &StopPairStore {
        &self.stops
    }

    pub fn controls(&self) -> &RunControls {
        &self.controls
    }

    pub fn renderer(&self) -> &FragmentRenderer {
        &self.renderer
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&RequestFailure> {
        self.last_error.as_ref()
    }

    pub fn add_stop(&mut self) -> StopPair {
        self.stops.append().clone()
    }

    pub fn remove_last_stop(&mut self) -> Option<StopPair> {
        self.stops.remove_last()
    }

    pub fn set_start(&mut self, index: usize, value: impl Into<String>) -> Result<(), StoreError> {
        self.stops.set_start(index, value)
    }

    pub fn set_end(&mut self, index: usize, value: impl Into<String>) -> Result<(), StoreError> {
        self.stops.set_end(index, value)
    }

    pub fn set_ant_count(&mut self, value: impl Into<String>) {
        self.controls.ant_count = value.into();
    }

    pub fn set_iteration_count(&mut self, value: impl Into<String>) {
        self.controls.iteration_count = value.into();
    }

    pub fn select_mode(&mut self, value: &str) -> Result<(), SessionError> {
        self.controls.mode.select(value)?;
        Ok(())
    }

    pub fn clear_mode(&mut self) {
        self.controls.mode.clear();
    }

    /// Build the query `recompute` would send right now.
    pub fn route_query(&self) -> Result<RouteQuery, SessionError> {
        let params = if self.include_run_parameters {
            Some(self.collector.collect(&self.controls)?)
        } else {
            None
        };
        Ok(RouteQuery::build(self.stops.pairs(), params.as_ref()))
    }

    /// Fetch the default stop layout. Returns the request's sequence number.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; the request runs as a
    /// spawned task.
    pub fn initialize(&mut self) -> u64 {
        self.dispatch(Endpoint::Stops, None)
    }

    /// Fetch routes for the current stops and controls.
    ///
    /// Parameter errors are returned before anything is sent.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, like [`MapSession::initialize`].
    pub fn recompute(&mut self) -> Result<u64, SessionError> {
        let query = self.route_query()?;
        Ok(self.dispatch(Endpoint::Routes, Some(query)))
    }

    fn dispatch(&mut self, endpoint: Endpoint, query: Option<RouteQuery>) -> u64 {
        let seq = self.renderer.issue();
        self.in_flight += 1;
        tracing::info!(seq, %endpoint, "request issued");

        let client = self.client.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch(endpoint, query.as_ref()).await;
            // The session may be gone; nobody is left to render then.
            let _ = tx.send(Completion {
                seq,
                endpoint,
                result,
            });
        });
        seq
    }

    /// Apply a finished request to the render target.
    pub fn complete(&mut self, completion: Completion) -> CompletionOutcome {
        let Completion {
            seq,
            endpoint,
            result,
        } = completion;
        self.in_flight = self.in_flight.saturating_sub(1);

        if !self.renderer.is_current(seq) {
            let latest = self.renderer.latest_issued();
            tracing::info!(seq, latest, "discarding stale response");
            return CompletionOutcome::Stale { seq, latest };
        }

        match result {
            Ok(fragment) => match self.renderer.render(seq, fragment) {
                RenderOutcome::Applied => {
                    self.last_error = None;
                    tracing::info!(seq, %endpoint, "fragment rendered");
                    CompletionOutcome::Rendered { seq, endpoint }
                }
                RenderOutcome::Stale { latest } => CompletionOutcome::Stale { seq, latest },
            },
            Err(e) => {
                tracing::warn!(seq, %endpoint, error = %e, "request failed");
                let failure = RequestFailure {
                    seq,
                    endpoint,
                    message: e.to_string(),
                };
                self.last_error = Some(failure.clone());
                CompletionOutcome::Failed(failure)
            }
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            stops: self.stops.snapshot(),
            ant_count: self.controls.ant_count.clone(),
            iteration_count: self.controls.iteration_count.clone(),
            modes: self.controls.mode.options().to_vec(),
            include_run_parameters: self.include_run_parameters,
            target: self.renderer.target().clone(),
            in_flight: self.in_flight,
            latest_seq: self.renderer.latest_issued(),
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamError;
    use tokio::sync::mpsc;

    fn session(cfg: SessionConfig) -> MapSession {
        let (tx, _rx) = mpsc::unbounded_channel();
        MapSession::new(&cfg, tx).unwrap()
    }

    fn completion(seq: u64, body: &str) -> Completion {
        Completion {
            seq,
            endpoint: Endpoint::Routes,
            result: Ok(Fragment::new(body)),
        }
    }

    #[test]
    fn seeds_from_config() {
        let s = session(SessionConfig {
            initial_stops: vec![("A".into(), "B".into()), ("C".into(), "D".into())],
            selected_mode: Some("shortest".into()),
            ..Default::default()
        });
        assert_eq!(s.stops().len(), 2);
        assert_eq!(s.controls().mode.selected(), Some("shortest"));
        assert_eq!(s.renderer().target().name, "map-container");
    }

    #[test]
    fn unknown_selected_mode_in_config_is_an_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let cfg = SessionConfig {
            selected_mode: Some("scenic".into()),
            ..Default::default()
        };
        assert!(matches!(
            MapSession::new(&cfg, tx),
            Err(SessionError::Params(ParamError::UnknownMode(_)))
        ));
    }

    #[test]
    fn route_query_reflects_current_controls() {
        let mut s = session(SessionConfig {
            initial_stops: vec![("A".into(), "B".into())],
            ..Default::default()
        });
        s.select_mode("fastest").unwrap();
        s.set_ant_count("12");
        s.add_stop();
        s.set_start(1, "C").unwrap();
        s.set_end(1, "D").unwrap();
        assert_eq!(
            s.route_query().unwrap().to_query_string(),
            "start_node=A&start_node=C&end_node=B&end_node=D&num_ants=12&num_iterations=10&mode=fastest"
        );
    }

    #[test]
    fn reduced_variant_ignores_the_mode_selector() {
        let s = session(SessionConfig {
            include_run_parameters: false,
            ..Default::default()
        });
        assert!(s.route_query().unwrap().params().is_none());
    }

    #[test]
    fn recompute_without_mode_fails_before_sending() {
        let mut s = session(SessionConfig {
            selected_mode: Some("fastest".into()),
            ..Default::default()
        });
        s.clear_mode();
        assert!(matches!(
            s.recompute(),
            Err(SessionError::Params(ParamError::NoModeSelected))
        ));
        assert_eq!(s.in_flight(), 0);
        assert_eq!(s.renderer().latest_issued(), 0);
    }

    #[test]
    #[should_panic]
    fn initialize_outside_a_runtime_panics() {
        let mut s = session(SessionConfig::default());
        s.initialize();
    }

    #[tokio::test]
    async fn out_of_order_completions_keep_the_latest_request() {
        let mut s = session(SessionConfig {
            selected_mode: Some("fastest".into()),
            ..Default::default()
        });
        let first = s.recompute().unwrap();
        let second = s.recompute().unwrap();
        assert_eq!(s.in_flight(), 2);

        assert_eq!(
            s.complete(completion(second, "second")),
            CompletionOutcome::Rendered {
                seq: second,
                endpoint: Endpoint::Routes
            }
        );
        assert_eq!(
            s.complete(completion(first, "first")),
            CompletionOutcome::Stale {
                seq: first,
                latest: second
            }
        );
        assert_eq!(s.view().target.content, "second");
        assert_eq!(s.in_flight(), 0);
    }

    #[tokio::test]
    async fn failure_leaves_target_unchanged_and_is_reported() {
        let mut s = session(SessionConfig::default());
        let seq = s.initialize();
        s.complete(Completion {
            seq,
            endpoint: Endpoint::Stops,
            result: Ok(Fragment::new("<div>stops</div>")),
        });

        let seq = s.initialize();
        let err = TransportError::InvalidBaseUrl("gone".into());
        let outcome = s.complete(Completion {
            seq,
            endpoint: Endpoint::Stops,
            result: Err(err),
        });
        assert!(matches!(outcome, CompletionOutcome::Failed(ref f) if f.seq == seq));
        assert_eq!(s.view().target.content, "<div>stops</div>");
        assert_eq!(s.last_error().map(|f| f.seq), Some(seq));
    }
}
