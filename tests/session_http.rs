//! End-to-end session tests against a mock route planning backend.

use route_planner_client::{
    Completion, CompletionOutcome, Endpoint, MapSession, SessionConfig, TransportError,
};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(server: &MockServer, cfg: SessionConfig) -> (MapSession, UnboundedReceiver<Completion>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let cfg = SessionConfig {
        base_url: server.uri(),
        ..cfg
    };
    (MapSession::new(&cfg, tx).unwrap(), rx)
}

/// Feed completions back until nothing is in flight, in arrival order.
async fn settle(
    session: &mut MapSession,
    rx: &mut UnboundedReceiver<Completion>,
) -> Vec<CompletionOutcome> {
    let mut outcomes = Vec::new();
    while session.in_flight() > 0 {
        let completion = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("request did not finish")
            .expect("completion channel closed");
        outcomes.push(session.complete(completion));
    }
    outcomes
}

#[tokio::test]
async fn routes_request_carries_pairs_and_run_parameters_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate_routes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<svg>routes</svg>"))
        .expect(1)
        .mount(&server)
        .await;

    let (mut s, mut rx) = session(
        &server,
        SessionConfig {
            initial_stops: vec![
                ("Bayfair".into(), "Greerton".into()),
                ("Mount Maunganui".into(), "Papamoa".into()),
            ],
            ant_count: "20".into(),
            iteration_count: "50".into(),
            selected_mode: Some("fastest".into()),
            ..Default::default()
        },
    );
    s.recompute().unwrap();
    let outcomes = settle(&mut s, &mut rx).await;
    assert_eq!(
        outcomes,
        vec![CompletionOutcome::Rendered {
            seq: 1,
            endpoint: Endpoint::Routes
        }]
    );
    assert_eq!(s.view().target.content, "<svg>routes</svg>");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].url.query(),
        Some(
            "start_node=Bayfair&start_node=Mount%20Maunganui\
             &end_node=Greerton&end_node=Papamoa\
             &num_ants=20&num_iterations=50&mode=fastest"
        )
    );
}

#[tokio::test]
async fn reduced_request_sends_only_the_stop_arrays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate_routes"))
        .and(query_param("start_node", "A"))
        .and(query_param("end_node", "B"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let (mut s, mut rx) = session(
        &server,
        SessionConfig {
            initial_stops: vec![("A".into(), "B".into())],
            include_run_parameters: false,
            ..Default::default()
        },
    );
    s.recompute().unwrap();
    settle(&mut s, &mut rx).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("start_node=A&end_node=B"));
    assert_eq!(s.view().target.content, "ok");
}

#[tokio::test]
async fn server_error_is_reported_and_target_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate_stops"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>layout</div>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate_routes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (mut s, mut rx) = session(
        &server,
        SessionConfig {
            selected_mode: Some("shortest".into()),
            ..Default::default()
        },
    );
    s.initialize();
    settle(&mut s, &mut rx).await;
    assert_eq!(s.view().target.content, "<div>layout</div>");

    s.recompute().unwrap();
    let outcomes = settle(&mut s, &mut rx).await;
    match &outcomes[..] {
        [CompletionOutcome::Failed(f)] => {
            assert_eq!(f.seq, 2);
            assert_eq!(f.endpoint, Endpoint::Routes);
            assert!(f.message.contains("500"), "{}", f.message);
        }
        other => panic!("unexpected outcomes: {other:?}"),
    }

    let view = s.view();
    assert_eq!(view.target.content, "<div>layout</div>");
    assert_eq!(view.target.rendered_seq, Some(1));
    assert_eq!(view.last_error.map(|f| f.seq), Some(2));
}

#[tokio::test]
async fn slow_earlier_response_does_not_overwrite_a_newer_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate_routes"))
        .and(query_param("mode", "fastest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("first")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate_routes"))
        .and(query_param("mode", "shortest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second"))
        .mount(&server)
        .await;

    let (mut s, mut rx) = session(
        &server,
        SessionConfig {
            selected_mode: Some("fastest".into()),
            ..Default::default()
        },
    );
    let first = s.recompute().unwrap();
    s.select_mode("shortest").unwrap();
    let second = s.recompute().unwrap();

    let outcomes = settle(&mut s, &mut rx).await;
    assert_eq!(
        outcomes,
        vec![
            CompletionOutcome::Rendered {
                seq: second,
                endpoint: Endpoint::Routes
            },
            CompletionOutcome::Stale {
                seq: first,
                latest: second
            },
        ]
    );
    assert_eq!(s.view().target.content, "second");
}

#[tokio::test]
async fn only_status_200_is_rendered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate_stops"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&server)
        .await;

    let (s, _rx) = session(&server, SessionConfig::default());
    let err = s
        .client()
        .fetch(Endpoint::Stops, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { .. }), "{err}");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cfg = SessionConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout: Some(Duration::from_secs(2)),
        ..Default::default()
    };
    let mut s = MapSession::new(&cfg, tx).unwrap();
    s.initialize();
    let outcomes = settle(&mut s, &mut rx).await;
    assert!(matches!(outcomes[..], [CompletionOutcome::Failed(_)]));
    assert_eq!(s.view().target.content, "");
}
