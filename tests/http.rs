use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

/// Fake platform API, served from its own thread so it outlives any single
/// test runtime.
static PLATFORM: Lazy<String> = Lazy::new(|| {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind platform port");
    listener.set_nonblocking(true).expect("nonblocking listener");
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("platform runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
            axum::serve(listener, platform_router()).await.expect("platform server");
        });
    });
    format!("http://{addr}")
});

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn platform_router() -> Router {
    Router::new()
        .route(
            "/api/polio/lqasimmap/country/:key/",
            get(|Path(key): Path<String>| async move {
                if key == "imGlobal_7" {
                    Ok(Json(im_stats()))
                } else {
                    Err(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }),
        )
        .route("/api/polio/lqasstats/:country/", get(|| async { Json(lqas_stats()) }))
        .route(
            "/api/polio/campaigns/:id/",
            get(|Path(id): Path<String>| async move {
                if id == "c1" {
                    Ok(Json(campaign()))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .route(
            "/api/orgunits/",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                match query.get("orgUnitTypeCategory").map(String::as_str) {
                    Some("REGION") => Json(json!([{ "id": 100, "name": "North", "geo_json": null }])),
                    _ => Json(json!((1..=4)
                        .map(|id| json!({
                            "id": id,
                            "name": format!("D{id}"),
                            "parent_id": 100,
                            "geo_json": { "type": "Polygon", "coordinates": [] }
                        }))
                        .collect::<Vec<_>>())),
                }
            }),
        )
        .route(
            "/api/polio/lqasim/countriesoptions/",
            get(|| async { Json(json!([{ "value": 7, "label": "Testland" }])) }),
        )
        .route(
            "/api/polio/lqasim/campaignoptions/",
            get(|| async { Json(json!({ "results": [{ "value": "c1", "label": "c1" }] })) }),
        )
}

fn campaign() -> Value {
    json!({
        "id": "c1",
        "obr_name": "TST-2023-01",
        "separate_scopes_per_round": false,
        "scopes": [
            { "group": { "org_units": [1, 2] }, "vaccine": "nOPV2" },
            { "group": { "org_units": [3] }, "vaccine": "bOPV" }
        ],
        "rounds": [{
            "number": 1,
            "started_at": "2023-03-01",
            "ended_at": "2023-03-04",
            "im_started_at": "2023-03-05",
            "im_ended_at": null,
            "lqas_started_at": null
        }]
    })
}

fn im_stats() -> Value {
    json!({
        "stats": {
            "c1": {
                "rounds": [{
                    "number": 1,
                    "data": {
                        "D1": {
                            "district": 1,
                            "total_child_checked": 100,
                            "total_child_fmd": 96,
                            "region_name": "North",
                            "care_giver_stats": {
                                "caregivers_informed": 50,
                                "caregivers_informed_ratio": 0.5,
                                "radio": 0.3
                            }
                        },
                        "D2": {
                            "district": 2,
                            "total_child_checked": 100,
                            "total_child_fmd": 92,
                            "region_name": "North"
                        },
                        "D2 ALIAS": {
                            "district": 2,
                            "total_child_checked": 100,
                            "total_child_fmd": 92,
                            "region_name": "North"
                        },
                        "D3": {
                            "district": 3,
                            "total_child_checked": 10,
                            "total_child_fmd": 12,
                            "region_name": "North"
                        },
                        "D5": {
                            "district": null,
                            "total_child_checked": 100,
                            "total_child_fmd": 100,
                            "region_name": "South"
                        },
                        "D4": {
                            "district": 4,
                            "total_child_checked": 100,
                            "total_child_fmd": 50,
                            "region_name": "South"
                        }
                    }
                }],
                "districts_not_found": ["GHOST"],
                "country_id": 7,
                "country_name": "Testland",
                "has_scope": true
            }
        }
    })
}

fn lqas_stats() -> Value {
    json!({
        "stats": {
            "c1": {
                "rounds": [{
                    "number": 1,
                    "data": {
                        "D1": { "district": 1, "total_child_checked": 60, "total_child_fmd": 57, "status": "1lqasOK" },
                        "D2": { "district": 2, "total_child_checked": 60, "total_child_fmd": 50, "status": "3lqasFail" }
                    }
                }]
            }
        }
    })
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_lqasim_map"))
        .env("PORT", port.to_string())
        .env("LQASIM_API_URL", PLATFORM.as_str())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn fetch(path: &str) -> (StatusCode, Value) {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!("{}{path}", server.base_url))
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body = response.text().await.unwrap();
    (status, serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

#[tokio::test]
async fn http_im_map_layer_follows_scope() {
    let (status, body) = fetch("/api/imGlobal/map?country=7&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["survey"], "imGlobal");
    assert_eq!(body["has_scope"], true);
    assert_eq!(body["districts_not_found"], json!(["GHOST"]));

    let entries = body["entries"].as_array().unwrap();
    let ids: Vec<i64> = entries.iter().map(|e| e["shape"]["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let statuses: Vec<&str> = entries.iter().map(|e| e["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["pass", "warning", "no_data"]);
    assert!(entries[2].get("data").is_none());

    assert_eq!(body["legend"]["pass"], 1);
    assert_eq!(body["legend"]["warning"], 1);
    assert_eq!(body["legend"]["no_data"], 1);
    assert_eq!(body["regions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn http_im_summary_counts_scope() {
    let (status, body) = fetch("/api/imGlobal/summary?country=7&campaign=c1&rounds=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope_count"], 3);
    assert_eq!(body["rate_passed"], "33");
    assert_eq!(body["counts"]["not_in_scope"], 1);
    assert_eq!(body["total_child_checked"], 200);
    assert_eq!(body["caregivers_informed"], 50);
    assert_eq!(body["caregivers_informed_ratio"], "25");
}

#[tokio::test]
async fn http_unusable_records_count_as_no_data() {
    let (status, body) = fetch("/api/imGlobal/summary?country=7&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["pass"], 1);
    assert_eq!(body["counts"]["warning"], 1);
    assert_eq!(body["counts"]["no_data"], 1);
    assert_eq!(body["counts"]["fail"], 0);
    assert_eq!(body["total_child_fmd"], 188);

    let (status, body) = fetch("/api/imGlobal/map?country=7&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::OK);
    let district_3 = &body["entries"][2];
    assert_eq!(district_3["shape"]["id"], 3);
    assert_eq!(district_3["status"], "no_data");
}

#[tokio::test]
async fn http_lqas_summary_uses_server_status() {
    let (status, body) = fetch("/api/lqas/summary?country=7&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["pass"], 1);
    assert_eq!(body["counts"]["fail"], 1);
    assert_eq!(body["counts"]["no_data"], 1);
    assert_eq!(body["rate_passed"], "33");
}

#[tokio::test]
async fn http_dates_prefer_survey_dates() {
    let (status, body) = fetch("/api/imGlobal/dates?campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start"], json!({ "date": "2023-03-05", "is_default": false }));
    assert_eq!(body["end"], json!({ "date": "2023-03-04", "is_default": true }));

    let (status, body) = fetch("/api/lqas/dates?campaign=c1&round=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "start": null, "end": null }));
}

#[tokio::test]
async fn http_unknown_campaign_has_no_scope() {
    let (status, body) = fetch("/api/imGlobal/map?country=7&campaign=gone&round=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_scope"], false);
    assert_eq!(body["entries"], json!([]));
}

#[tokio::test]
async fn http_rejects_bad_requests() {
    let (status, _) = fetch("/api/vaccines/map?country=7&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fetch("/api/lqas/map?country=7&campaign=c1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fetch("/api/lqas/map?country=seven&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_upstream_failure_is_bad_gateway() {
    let (status, _) = fetch("/api/imOHH/summary?country=7&campaign=c1&round=1").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn http_comparison_sides_are_independent() {
    let (status, body) = fetch(
        "/api/imGlobal/compare?leftCountry=7&leftCampaign=c1&leftRound=1&rightCampaign=c1&rightRound=1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["left"]["summary"]["rate_passed"], "33");
    assert!(body["left"].get("error").is_none());
    assert!(body["right"].get("summary").is_none());
    assert!(body["right"]["error"].as_str().unwrap().contains("country"));
}

#[tokio::test]
async fn http_options_accept_both_shapes() {
    let (status, body) = fetch("/api/lqas/options/countries?month=3&year=2023").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "value": 7, "label": "Testland" }]));

    let (status, body) = fetch("/api/lqas/options/campaigns?country=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["value"], "c1");

    let (status, _) = fetch("/api/lqas/options/vaccines").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_query_reducer_resets_on_country_change() {
    let (status, body) = fetch("/query/reduce?campaign=c1&country=7&rounds=1&tab=list&set=country&value=8").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"]["country"], "8");
    assert_eq!(body["query"]["campaign"], Value::Null);
    assert_eq!(body["query"]["tab"], "list");
    assert_eq!(body["params"], json!([["country", "8"], ["tab", "list"]]));

    let (status, body) = fetch("/query/compare/reduce?leftCampaign=a&rightCampaign=b&side=left&set=clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"]["right"]["campaign"], "b");
    assert_eq!(body["query"]["left"]["campaign"], Value::Null);
}
