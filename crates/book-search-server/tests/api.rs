//! HTTP API and fan-out tests against stubbed upstream sites.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use book_search::{HttpClient, SiteRegistry, SiteResult, SiteRule, SiteSearcher};
use book_search_server::{router, AppState, FanOutClient, FanOutState, ServerConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─────────────────────── helpers ───────────────────────

const PAGE: &str = r#"<html><body><ul>
    <li><a class="t" href="/b/1">测试 之书</a><span class="w">某作者</span></li>
    <li><a class="t" href="/b/2">无关</a><span class="w">别人</span></li>
</ul></body></html>"#;

const SITES: usize = 4;

/// Mount `PAGE` under `/s/{i}` for every site, except a 502 on site 2.
async fn stub_sites(server: &MockServer) -> SiteRegistry {
    let mut rules = Vec::new();
    for i in 0..SITES {
        let response = if i == 2 {
            ResponseTemplate::new(502).set_body_string("bad gateway")
        } else {
            ResponseTemplate::new(200).set_body_string(PAGE)
        };
        Mock::given(method("GET"))
            .and(path(format!("/s/{i}")))
            .respond_with(response)
            .mount(server)
            .await;

        let rule = SiteRule::new(
            &format!("站点{i}"),
            &format!("{}/s/{i}?q={{}}", server.uri()),
            "li",
            "a.t",
            "a.t",
        )
        .book_url(&format!("https://site{i}.test{{}}"))
        .author("span.w");
        rules.push(rule);
    }
    SiteRegistry::new(rules)
}

async fn test_state(server: &MockServer) -> Arc<AppState> {
    let registry = stub_sites(server).await;
    let searcher = SiteSearcher::new(HttpClient::default(), Arc::new(registry));
    Arc::new(AppState::with_searcher(searcher, ServerConfig::default()))
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Option<String>, Value) {
    let resp = router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let cache = resp
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, cache, serde_json::from_slice(&bytes).unwrap())
}

// ─────────────────────── /api/search ───────────────────────

#[tokio::test]
async fn rejects_invalid_params_with_400() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    for uri in [
        "/api/search?name=&src=0",
        "/api/search?name=%20%20&src=0",
        "/api/search?name=foo&src=-1",
        "/api/search?name=foo&src=999",
        "/api/search?name=foo&src=abc",
        "/api/search?name=foo",
        "/api/search?src=0",
    ] {
        let (status, cache, body) = get(state.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(cache.is_none(), "{uri}");
        assert_eq!(
            body["message"],
            "param 'name' and 'src' should be string and not empty"
        );
    }

    // Nothing reached upstream.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn returns_matching_books_with_cache_header() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    let (status, cache, body) = get(state, "/api/search?name=%E6%B5%8B%E8%AF%95&src=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("max-age=0, s-maxage=172800"));

    let result: SiteResult = serde_json::from_value(body).unwrap();
    assert_eq!(result.site, "站点0");
    assert!(result.success);
    assert_eq!(result.message, "");
    assert_eq!(result.books.len(), 1);
    assert_eq!(result.books[0].name, "测试之书");
    assert_eq!(result.books[0].url, "https://site0.test/b/1");
    assert_eq!(result.books[0].author, "某作者");
    assert_eq!(result.books[0].summary, "");
}

#[tokio::test]
async fn query_is_normalized_before_searching() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    let (status, _, body) = get(state, "/api/search?name=%20%E6%B5%8B%20%E8%AF%95%20&src=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"].as_array().unwrap().len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), Some("q=%E6%B5%8B%E8%AF%95"));
}

#[tokio::test]
async fn upstream_failure_is_a_200_with_success_false() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    let (status, _, body) = get(state, "/api/search?name=foo&src=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "\nbad gateway");
    assert!(body["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn no_store_when_caching_disabled() {
    let server = MockServer::start().await;
    let registry = stub_sites(&server).await;
    let searcher = SiteSearcher::new(HttpClient::default(), Arc::new(registry));
    let config = ServerConfig {
        cache_max_age: 0,
        ..ServerConfig::default()
    };
    let state = Arc::new(AppState::with_searcher(searcher, config));

    let (_, cache, _) = get(state, "/api/search?name=foo&src=0").await;
    assert_eq!(cache.as_deref(), Some("no-store"));
}

#[tokio::test]
async fn repeated_params_get_the_json_400() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    for uri in [
        "/api/search?name=a&name=b&src=0",
        "/api/search?name=foo&src=0&src=1",
    ] {
        let resp = router(state.clone())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/json",
            "{uri}"
        );
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["message"],
            "param 'name' and 'src' should be string and not empty"
        );
    }
}

// ─────────────────────── /api/sites, /health ───────────────────────

#[tokio::test]
async fn sites_lists_rules_in_index_order() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    let (status, _, body) = get(state, "/api/sites").await;
    assert_eq!(status, StatusCode::OK);
    let sites = body["sites"].as_array().unwrap();
    assert_eq!(sites.len(), SITES);
    for (i, site) in sites.iter().enumerate() {
        assert_eq!(site["index"], i);
        assert_eq!(site["site"], format!("站点{i}"));
    }
}

#[tokio::test]
async fn health_reports_site_count() {
    let server = MockServer::start().await;
    let state = test_state(&server).await;

    let (status, _, body) = get(state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sites"], SITES);
}

#[tokio::test]
async fn builtin_state_serves_every_builtin_site() {
    let state = Arc::new(AppState::new(ServerConfig::default()));
    let (_, _, body) = get(state, "/api/sites").await;
    assert_eq!(
        body["sites"].as_array().unwrap().len(),
        SiteRegistry::builtin().len()
    );
}

// ─────────────────────── fan-out ───────────────────────

#[tokio::test]
async fn fan_out_through_a_running_server() {
    let upstream = MockServer::start().await;
    let state = test_state(&upstream).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    let client = FanOutClient::new(&format!("http://{addr}/"));
    let sites = client.site_names().await;
    assert_eq!(sites.len(), SITES);
    let mut updates: Vec<FanOutState> = Vec::new();
    let state = client
        .search_all(&sites, "测试", |s| updates.push(s.clone()))
        .await;

    assert!(!state.searching);
    assert!(state.is_settled(SITES));
    for (i, result) in &state.results {
        assert_eq!(result.site, format!("站点{i}"));
        assert_eq!(result.success, *i != 2, "site {i}");
    }
    assert_eq!(state.result(0).unwrap().books[0].name, "测试之书");

    let (last, rest) = updates.split_last().unwrap();
    assert!(rest.iter().all(|s| s.searching));
    assert!(!last.searching);
}

#[tokio::test]
async fn api_error_for_one_site_is_synthesized_client_side() {
    let api = MockServer::start().await;
    let sites = serde_json::json!({
        "sites": (0..3).map(|i| serde_json::json!({
            "index": i,
            "site": format!("站点{i}"),
            "name": format!("站点{i}"),
            "encoding": "utf8",
            "kind": "html",
        })).collect::<Vec<_>>()
    });
    Mock::given(method("GET"))
        .and(path("/api/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sites))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("src", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .with_priority(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(SiteResult::new("ok")))
        .mount(&api)
        .await;

    let client = FanOutClient::new(&api.uri());
    let sites = client.site_names().await;
    let state = client.search_all(&sites, "书", |_| {}).await;

    assert!(state.is_settled(3));
    assert!(state.result(0).unwrap().success);
    assert!(state.result(1).unwrap().success);
    let failed = state.result(2).unwrap();
    assert!(!failed.success);
    assert_eq!(failed.site, "站点2");
    assert!(failed.message.contains("boom"));
}

#[tokio::test]
async fn unreachable_api_fails_every_site_without_aborting() {
    // Nothing listens on the discard port.
    let client = FanOutClient::new("http://127.0.0.1:9");

    let sites = client.site_names().await;
    assert_eq!(sites, SiteRegistry::builtin().names());

    let mut updates = 0;
    let state = client.search_all(&sites, "书", |_| updates += 1).await;

    assert!(!state.searching);
    assert!(state.is_settled(sites.len()));
    for (i, result) in &state.results {
        assert_eq!(result.site, sites[*i]);
        assert!(!result.success);
        assert!(!result.message.is_empty());
    }
    assert_eq!(updates, sites.len() + 2);
}
