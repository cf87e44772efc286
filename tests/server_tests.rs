use std::net::SocketAddr;
use std::sync::Arc;

use chrono::NaiveDate;

use tailgate_schedule_sync::espn::EspnFeed;
use tailgate_schedule_sync::model::game::{GameRecord, GameStatus};
use tailgate_schedule_sync::reconcile::{LiveReconciler, Reconciler};
use tailgate_schedule_sync::server::{self, ServerState};
use tailgate_schedule_sync::store::{MemoryStore, SharedStore};

const TOKEN: &str = "tailgate-admin";

fn oklahoma_tbd() -> GameRecord {
    serde_json::from_value(serde_json::json!({
        "date": "2025-10-11",
        "time": "TBD",
        "opponent": "Oklahoma",
        "tvNetwork": "TBD",
        "status": "unplanned"
    }))
    .unwrap()
}

/// Start the manual sync server on an ephemeral port.
async fn start(feed_url: String, memory: Arc<MemoryStore>) -> SocketAddr {
    let store: SharedStore = memory;
    let feed = EspnFeed::new(feed_url, "251", chrono_tz::America::Chicago);
    let reconciler: LiveReconciler =
        Reconciler::new(feed, store, chrono_tz::America::Chicago).with_season(Some(2025));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, ServerState::new(Arc::new(reconciler), TOKEN)));
    addr
}

/// POST without a body and return (status, json body).
async fn post(url: String, authorization: Option<&'static str>) -> (u16, serde_json::Value) {
    tokio::task::spawn_blocking(move || {
        let agent: ureq::Agent = ureq::Agent::config_builder().http_status_as_error(false).build().into();
        let mut request = agent.post(&url);
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        let response = request.send_empty().unwrap();
        let status = response.status().as_u16();
        let body = response.into_body().read_json::<serde_json::Value>().unwrap();
        (status, body)
    })
    .await
    .unwrap()
}

async fn get(url: String, authorization: Option<&'static str>) -> (u16, serde_json::Value) {
    tokio::task::spawn_blocking(move || {
        let agent: ureq::Agent = ureq::Agent::config_builder().http_status_as_error(false).build().into();
        let mut request = agent.get(&url);
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        let response = request.call().unwrap();
        let status = response.status().as_u16();
        let body = response.into_body().read_json::<serde_json::Value>().unwrap();
        (status, body)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejects_missing_or_malformed_credentials() {
    let memory = Arc::new(MemoryStore::with_games([oklahoma_tbd()]));
    // The feed is never reached when authorization fails
    let addr = start("http://127.0.0.1:9".to_string(), memory.clone()).await;
    let url = format!("http://{addr}/scheduleSync");

    for header in [None, Some("tailgate-admin"), Some("Basic dGFpbGdhdGU="), Some("Bearer wrong")] {
        let (status, body) = post(url.clone(), header).await;
        assert_eq!(status, 401, "header {:?}", header);
        assert_eq!(body["success"], false);
    }
    assert!(memory.logs().is_empty(), "engine must not run on 401");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn manual_sync_returns_summary() {
    let mut feed_server = mockito::Server::new_async().await;
    let _feed = feed_server
        .mock("GET", "/teams/251/schedule")
        .match_query(mockito::Matcher::UrlEncoded("season".into(), "2025".into()))
        .with_status(200)
        .with_body(std::fs::read_to_string("tests/sample_schedule.json").unwrap())
        .create_async()
        .await;

    let memory = Arc::new(MemoryStore::with_games([oklahoma_tbd()]));
    let addr = start(feed_server.url(), memory.clone()).await;

    let (status, body) = post(format!("http://{addr}/scheduleSync"), Some("Bearer tailgate-admin")).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    // Oklahoma gets its kickoff and network, the Fiesta Bowl is added
    assert_eq!(body["result"]["updated"], 1);
    assert_eq!(body["result"]["added"], 1);
    assert_eq!(body["result"]["errors"], serde_json::json!([]));
    assert!(body["result"]["timestamp"].is_string());

    let ou = memory.get("g1").unwrap();
    assert_eq!(ou.time, "2:30 PM");
    assert_eq!(ou.tv_network, "ABC");
    let bowl = memory
        .games()
        .into_iter()
        .find(|g| g.record.is_bowl_game)
        .expect("bowl game inserted");
    assert_eq!(bowl.record.date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    assert_eq!(bowl.record.status, GameStatus::Unplanned);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn feed_outage_still_answers_with_errors() {
    let memory = Arc::new(MemoryStore::with_games([oklahoma_tbd()]));
    let addr = start("http://127.0.0.1:9".to_string(), memory.clone()).await;

    let (status, body) = post(format!("http://{addr}/scheduleSync"), Some("Bearer tailgate-admin")).await;

    assert_eq!(status, 200);
    assert_eq!(body["result"]["updated"], 0);
    assert_eq!(body["result"]["errors"].as_array().unwrap().len(), 1);
    assert_eq!(memory.logs().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_logs_lists_history() {
    let memory = Arc::new(MemoryStore::with_games([oklahoma_tbd()]));
    let addr = start("http://127.0.0.1:9".to_string(), memory.clone()).await;
    for _ in 0..3 {
        post(format!("http://{addr}/scheduleSync"), Some("Bearer tailgate-admin")).await;
    }

    let (status, body) = get(format!("http://{addr}/syncLogs?limit=2"), Some("Bearer tailgate-admin")).await;
    assert_eq!(status, 200);
    assert_eq!(body["logs"].as_array().unwrap().len(), 2);

    let (status, _) = get(format!("http://{addr}/syncLogs"), None).await;
    assert_eq!(status, 401);

    let (status, body) = get(format!("http://{addr}/health"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}
