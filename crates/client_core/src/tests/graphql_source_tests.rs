use super::*;
use crate::PaginationController;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use shared::domain::VolunteerId;
use std::{num::NonZeroUsize, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct RosterServerState {
    total: usize,
    chunk_len: usize,
    cursors: Arc<Mutex<Vec<usize>>>,
}

async fn handle_roster(
    State(state): State<RosterServerState>,
    Json(request): Json<GraphqlRequest>,
) -> Json<Value> {
    let cursor = request.variables.cursor;
    state.cursors.lock().await.push(cursor);
    let end = (cursor + state.chunk_len).min(state.total);
    let users: Vec<Value> = (cursor.min(end)..end)
        .map(|index| {
            json!({
                "id": index.to_string(),
                "firstName": format!("First{index}"),
                "lastName": format!("Last{index}"),
                "email": format!("v{index}@example.org"),
            })
        })
        .collect();
    Json(json!({
        "data": {
            "users": users,
            "userAggregates": { "totalCount": state.total }
        }
    }))
}

async fn spawn_roster_server(total: usize, chunk_len: usize) -> anyhow::Result<(String, RosterServerState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = RosterServerState {
        total,
        chunk_len,
        cursors: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/graphql", post(handle_roster))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/graphql"), state))
}

async fn spawn_static_server<F, R>(handler: F) -> anyhow::Result<String>
where
    F: Fn() -> R + Clone + Send + Sync + 'static,
    R: IntoResponse + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route(
        "/graphql",
        post(move || {
            let handler = handler.clone();
            async move { handler() }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/graphql"))
}

#[tokio::test]
async fn fetches_one_page_from_the_cursor() {
    let (endpoint, state) = spawn_roster_server(5, 2).await.expect("spawn server");
    let source = GraphqlPageSource::new(&endpoint).expect("source");

    let page = source.fetch_page(2).await.expect("page");

    assert_eq!(*state.cursors.lock().await, vec![2]);
    assert_eq!(page.total_count, 5);
    let ids: Vec<VolunteerId> = page.items.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![VolunteerId(2), VolunteerId(3)]);
    assert_eq!(page.items[0].email.as_deref(), Some("v2@example.org"));
}

#[tokio::test]
async fn controller_pages_through_the_http_roster() {
    let (endpoint, state) = spawn_roster_server(5, 2).await.expect("spawn server");
    let source = Arc::new(GraphqlPageSource::new(&endpoint).expect("source"));
    let controller =
        PaginationController::new_with_page_size(source, NonZeroUsize::new(2).expect("size"));

    for page in 0..3 {
        controller.goto_page(page).await.expect("navigation");
    }

    assert_eq!(*state.cursors.lock().await, vec![0, 2, 4]);
    let view = controller.visible_window().await;
    assert_eq!(
        view.items().map(|v| v.id).collect::<Vec<_>>(),
        vec![VolunteerId(4)]
    );
    assert_eq!(view.total_count, Some(5));
}

#[tokio::test]
async fn error_status_surfaces_graphql_error_messages() {
    let endpoint = spawn_static_server(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "errors": [{"message": "Variable \"$cursor\" got invalid value"}]
            })),
        )
    })
    .await
    .expect("spawn server");
    let source = GraphqlPageSource::new(&endpoint).expect("source");

    let err = source.fetch_page(0).await.expect_err("must fail");

    assert_eq!(err.status, Some(400));
    assert_eq!(err.cursor, 0);
    assert_eq!(err.message, "Variable \"$cursor\" got invalid value");
}

#[tokio::test]
async fn error_status_with_plain_body_reports_status_and_text() {
    let endpoint = spawn_static_server(|| (StatusCode::SERVICE_UNAVAILABLE, "upstream overloaded\n"))
        .await
        .expect("spawn server");
    let source = GraphqlPageSource::new(&endpoint).expect("source");

    let err = source.fetch_page(10).await.expect_err("must fail");

    assert_eq!(err.status, Some(503));
    assert_eq!(err.cursor, 10);
    assert_eq!(
        err.message,
        "server responded with 503 Service Unavailable: upstream overloaded"
    );
}

#[tokio::test]
async fn graphql_errors_fail_the_fetch() {
    let endpoint = spawn_static_server(|| {
        Json(json!({
            "data": null,
            "errors": [{"message": "cursor out of bounds"}, {"message": "try again"}]
        }))
    })
    .await
    .expect("spawn server");
    let source = GraphqlPageSource::new(&endpoint).expect("source");

    let err = source.fetch_page(40).await.expect_err("must fail");

    assert_eq!(err.status, None);
    assert_eq!(err.message, "cursor out of bounds; try again");
}

#[tokio::test]
async fn missing_data_fails_the_fetch() {
    let endpoint = spawn_static_server(|| Json(json!({})))
        .await
        .expect("spawn server");
    let source = GraphqlPageSource::new(&endpoint).expect("source");

    let err = source.fetch_page(0).await.expect_err("must fail");

    assert!(err.message.contains("no data"), "{}", err.message);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_fetch_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let source = GraphqlPageSource::new(&format!("http://{addr}/graphql")).expect("source");

    let err = source.fetch_page(0).await.expect_err("must fail");

    assert!(err.message.starts_with("request failed"), "{}", err.message);
}

#[test]
fn rejects_invalid_endpoint() {
    assert!(GraphqlPageSource::new("not a url").is_err());
}
