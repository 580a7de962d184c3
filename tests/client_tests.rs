//! HTTP behaviour of the client against a wiremock server.

use std::time::Duration;

use hex_toolkit::{
    ApiError, Client, ClientBuilder, EmbeddingRequest, HexError, ListProjectsParams,
    ListRunsParams, PollOptions, PollOutcome, RunProjectRequest, RunStatus, SortBy, SortDirection,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "12345678-1234-1234-1234-123456789012";
const RUN: &str = "87654321-4321-4321-4321-210987654321";

fn client_for(server: &MockServer) -> Client {
    ClientBuilder::new()
        .api_key("test-api-key")
        .base_url(server.uri())
        .max_retries(0)
        .build()
        .unwrap()
}

fn sample_project() -> serde_json::Value {
    json!({
        "id": PROJECT,
        "title": "Test Project",
        "description": "A test project",
        "type": "PROJECT",
        "creator": {"email": "creator@test.com"},
        "owner": {"email": "owner@test.com"},
        "status": {"name": "Published"},
        "categories": [{"name": "Test", "description": "Test category"}],
        "reviews": {"required": false},
        "analytics": {
            "publishedResultsUpdatedAt": "2024-01-01T00:00:00Z",
            "lastViewedAt": "2024-01-01T00:00:00Z",
            "appViews": {
                "lastThirtyDays": 100,
                "lastFourteenDays": 50,
                "lastSevenDays": 25,
                "allTime": 1000
            }
        },
        "lastEditedAt": "2024-01-01T00:00:00Z",
        "lastPublishedAt": "2024-01-01T00:00:00Z",
        "createdAt": "2024-01-01T00:00:00Z",
        "archivedAt": null,
        "trashedAt": null,
        "schedules": [{
            "cadence": "DAILY",
            "enabled": true,
            "daily": {"timezone": "UTC", "hour": 6, "minute": 30}
        }],
        "sharing": {
            "users": [{"user": {"email": "a@test.com"}, "access": "CAN_EDIT"}],
            "collections": [],
            "groups": [{"group": {"name": "Analysts"}, "access": "CAN_VIEW"}],
            "workspace": {"access": "CAN_VIEW"},
            "publicWeb": {"access": "NONE"},
            "support": {"access": "NONE"}
        }
    })
}

fn run_started() -> serde_json::Value {
    json!({
        "projectId": PROJECT,
        "runId": RUN,
        "runUrl": "https://test.hex.tech/app/runs/test-run",
        "runStatusUrl": "https://test.hex.tech/api/v1/projects/test/runs/test-run",
        "traceId": "test-trace-id",
        "projectVersion": 42,
        "notifications": []
    })
}

#[tokio::test]
async fn test_get_project_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}")))
        .and(header("authorization", "Bearer test-api-key"))
        .and(query_param("includeSharing", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_project()))
        .expect(1)
        .mount(&server)
        .await;

    let project = client_for(&server).get_project(PROJECT, true).await.unwrap();

    assert_eq!(project.title, "Test Project");
    assert_eq!(project.owner.unwrap().email, "owner@test.com");
    assert_eq!(project.analytics.unwrap().app_views.unwrap().all_time, 1000);
    assert_eq!(project.schedules[0].time().unwrap().hour, Some(6));
    let sharing = project.sharing.unwrap();
    assert_eq!(sharing.groups[0].group.name, "Analysts");
}

#[tokio::test]
async fn test_list_projects_passes_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .and(query_param("limit", "10"))
        .and(query_param("includeArchived", "true"))
        .and(query_param("sortBy", "CREATED_AT"))
        .and(query_param("sortDirection", "DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [sample_project()],
            "pagination": {"after": "cursor-2", "before": null}
        })))
        .mount(&server)
        .await;

    let params = ListProjectsParams {
        limit: 10,
        include_archived: true,
        sort_by: Some(SortBy::CreatedAt),
        sort_direction: Some(SortDirection::Desc),
        ..Default::default()
    };
    let list = client_for(&server).list_projects(&params).await.unwrap();

    assert_eq!(list.values.len(), 1);
    assert!(list.has_more());
    assert_eq!(list.pagination.after.as_deref(), Some("cursor-2"));
}

#[tokio::test]
async fn test_list_projects_rejects_bad_limit() {
    let server = MockServer::start().await;
    let params = ListProjectsParams {
        limit: 0,
        ..Default::default()
    };

    let err = client_for(&server).list_projects(&params).await.unwrap_err();
    assert!(matches!(err, HexError::InvalidInput(_)));
}

#[tokio::test]
async fn test_search_projects_walks_pages() {
    let server = MockServer::start().await;

    let mut other = sample_project();
    other["title"] = json!("Churn Model");
    other["description"] = json!("weekly churn");

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .and(query_param("after", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [sample_project()],
            "pagination": {}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [other],
            "pagination": {"after": "page-2"}
        })))
        .mount(&server)
        .await;

    let found = client_for(&server)
        .search_projects(&ListProjectsParams::default(), "TEST")
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Test Project");
}

#[tokio::test]
async fn test_search_projects_stops_on_repeated_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .and(query_param("after", "stuck"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [sample_project()],
            "pagination": {"after": "stuck"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [sample_project()],
            "pagination": {"after": "stuck"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = tokio::time::timeout(
        Duration::from_secs(5),
        client_for(&server).search_projects(&ListProjectsParams::default(), "test"),
    )
    .await
    .expect("search should end when the cursor repeats")
    .unwrap();

    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_run_project_posts_camel_case_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{PROJECT}/runs")))
        .and(body_json(json!({
            "inputParams": {"date_range": "last_30_days"},
            "dryRun": false,
            "updatePublishedResults": true,
            "useCachedSqlResults": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_started()))
        .expect(1)
        .mount(&server)
        .await;

    let mut input = serde_json::Map::new();
    input.insert("date_range".into(), json!("last_30_days"));
    let request = RunProjectRequest {
        input_params: Some(input),
        update_published_results: true,
        ..Default::default()
    };

    let run = client_for(&server).run_project(PROJECT, &request).await.unwrap();

    assert_eq!(run.run_id, RUN);
    assert_eq!(run.project_version, 42);
    assert_eq!(run.trace_id.as_deref(), Some("test-trace-id"));
}

#[tokio::test]
async fn test_get_run_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/runs/{RUN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projectId": PROJECT,
            "runId": RUN,
            "status": "COMPLETED",
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": "2024-01-01T00:01:00Z",
            "elapsedTime": 60000
        })))
        .mount(&server)
        .await;

    let status = client_for(&server).get_run_status(PROJECT, RUN).await.unwrap();

    assert_eq!(status.status, RunStatus::Completed);
    assert_eq!(status.elapsed_time, Some(60000.0));
    assert_eq!(status.duration(), Some(chrono::Duration::seconds(60)));
}

#[tokio::test]
async fn test_list_runs_with_status_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/runs")))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .and(query_param("statusFilter", "COMPLETED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "runs": [
                {"runId": "run-1", "status": "COMPLETED", "startTime": "2024-01-01T00:00:00Z"},
                {"runId": "run-2", "status": "COMPLETED"}
            ],
            "nextPage": "cursor123"
        })))
        .mount(&server)
        .await;

    let params = ListRunsParams {
        limit: 5,
        offset: 10,
        status: Some(RunStatus::Completed),
    };
    let list = client_for(&server).list_runs(PROJECT, &params).await.unwrap();

    assert_eq!(list.runs.len(), 2);
    assert_eq!(list.next_page.as_deref(), Some("cursor123"));
}

#[tokio::test]
async fn test_cancel_run_accepts_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/v1/projects/{PROJECT}/runs/{RUN}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).cancel_run(PROJECT, RUN).await.unwrap();
}

#[tokio::test]
async fn test_create_presigned_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/embedding/createPresignedUrl/{PROJECT}")))
        .and(body_json(json!({"expiresIn": 60000, "testMode": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://test.hex.tech/embed/signed-url"})),
        )
        .mount(&server)
        .await;

    let request = EmbeddingRequest {
        expires_in: Some(60_000),
        test_mode: true,
        ..Default::default()
    };
    let resp = client_for(&server)
        .create_presigned_url(PROJECT, &request)
        .await
        .unwrap();

    assert_eq!(resp.url, "https://test.hex.tech/embed/signed-url");
}

#[tokio::test]
async fn test_presigned_url_expiry_is_bounded() {
    let server = MockServer::start().await;
    let request = EmbeddingRequest {
        expires_in: Some(300_001),
        ..Default::default()
    };

    let err = client_for(&server)
        .create_presigned_url(PROJECT, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, HexError::InvalidInput(_)));
}

#[tokio::test]
async fn test_authentication_error_carries_trace_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "reason": "Unauthorized",
            "traceId": "test-trace"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_projects(&ListProjectsParams::default())
        .await
        .unwrap_err();

    match err {
        HexError::Api(api @ ApiError::Authentication(_)) => {
            assert_eq!(api.status_code(), Some(401));
            assert_eq!(api.trace_id(), Some("test-trace"));
            assert!(api.to_string().contains("Authentication failed"));
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_error_lists_params() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{PROJECT}/runs")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "reason": "Validation failed",
            "invalid": [{
                "dataType": "NUMBER",
                "inputCellType": "INPUT",
                "paramValue": "abc",
                "paramName": "threshold"
            }],
            "notFound": ["region"]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run_project(PROJECT, &RunProjectRequest::default())
        .await
        .unwrap_err();

    match err {
        HexError::Api(ApiError::Validation {
            invalid_params,
            not_found_params,
            ..
        }) => {
            assert_eq!(invalid_params[0].param_name, "threshold");
            assert_eq!(not_found_params, vec!["region".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}")))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>gone</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_project(PROJECT, false).await.unwrap_err();
    assert!(matches!(err, HexError::Api(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_server_error_is_retried_then_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/runs/{RUN}")))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"reason": "down"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = ClientBuilder::new()
        .api_key("test-api-key")
        .base_url(server.uri())
        .max_retries(1)
        .build()
        .unwrap();

    let err = client.get_run_status(PROJECT, RUN).await.unwrap_err();
    assert!(matches!(err, HexError::Api(ApiError::Server(_))));
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/runs/{RUN}")))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"reason": "Rate limit exceeded"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/runs/{RUN}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"runId": RUN, "status": "RUNNING"})),
        )
        .mount(&server)
        .await;

    let client = ClientBuilder::new()
        .api_key("test-api-key")
        .base_url(server.uri())
        .max_retries(1)
        .build()
        .unwrap();

    let status = client.get_run_status(PROJECT, RUN).await.unwrap();
    assert_eq!(status.status, RunStatus::Running);
}

#[tokio::test]
async fn test_huge_retry_after_is_capped_by_max_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{PROJECT}/runs/{RUN}")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "86400"))
        .expect(2)
        .mount(&server)
        .await;

    let client = ClientBuilder::new()
        .api_key("test-api-key")
        .base_url(server.uri())
        .max_retries(1)
        .max_backoff(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = tokio::time::timeout(Duration::from_secs(10), client.get_run_status(PROJECT, RUN))
        .await
        .expect("retry wait should be capped, not a full day")
        .unwrap_err();

    // The hint is still reported to the caller as sent.
    assert!(matches!(
        err,
        HexError::Api(ApiError::RateLimit {
            retry_after: Some(86400),
            ..
        })
    ));
}

#[tokio::test]
async fn test_rate_limit_without_retries_exposes_hint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "60"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_projects(&ListProjectsParams::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HexError::Api(ApiError::RateLimit {
            retry_after: Some(60),
            ..
        })
    ));
}

#[tokio::test]
async fn test_wait_for_run_reaches_terminal_state() {
    let server = MockServer::start().await;
    let status_path = format!("/v1/projects/{PROJECT}/runs/{RUN}");

    Mock::given(method("GET"))
        .and(path(status_path.clone()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"runId": RUN, "status": "RUNNING"})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "runId": RUN,
            "status": "ERRORED",
            "error": {"message": "query timed out"}
        })))
        .mount(&server)
        .await;

    let opts = PollOptions::default().with_interval(Duration::from_millis(10));
    let outcome = client_for(&server)
        .wait_for_run(PROJECT, RUN, opts)
        .await
        .unwrap();

    match outcome {
        PollOutcome::Finished(status) => {
            assert_eq!(status.status, RunStatus::Errored);
            assert_eq!(status.error.unwrap()["message"], "query timed out");
        }
        other => panic!("expected finished, got {other:?}"),
    }
}

#[test]
fn test_client_requires_api_key() {
    let err = ClientBuilder::new().api_key("").build().unwrap_err();
    assert!(matches!(err, HexError::Config(_)));

    let client = Client::new("key").unwrap();
    assert!(client.base_url().starts_with("https://"));
}
