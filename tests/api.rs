use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use cinema_seating::{
    build_router, cache::CacheService, config::Config, services::inventory::InventoryClient,
    AppState,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seat_json(id: i64, row: &str, column: i64, type_name: &str, price: i64) -> Value {
    json!({
        "id": id,
        "row_label": row,
        "column_number": column,
        "seat_type_id": if type_name == "Standard" { 1 } else { 3 },
        "seat_type_name": type_name,
        "status": "EMPTY",
        "price": price.to_string(),
    })
}

/// Сеанс 12: ряд A из 10 обычных мест, ряд B из 4 пар.
/// Зал 4: ряд A из 4 мест, ряд B из 2 пар, пара B1 занята.
async fn inventory() -> MockServer {
    inventory_with_hold(ResponseTemplate::new(200)).await
}

async fn inventory_with_hold(hold: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;

    let mut seats: Vec<Value> = (1..=10).map(|c| seat_json(c, "A", c, "Standard", 75_000)).collect();
    seats.extend((1..=8).map(|c| seat_json(100 + c, "B", c, "Couple", 150_000)));

    Mock::given(method("GET"))
        .and(path("/showtimes/12/seats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(seats)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/combos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Popcorn", "price": "50000" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/showtimes/12/holds"))
        .respond_with(hold)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/showtimes/12/seats/101/ttl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ttl": 300 })))
        .mount(&server)
        .await;
    let mut room: Vec<Value> = (1..=4).map(|c| seat_json(200 + c, "A", c, "Standard", 75_000)).collect();
    room.extend((1..=4).map(|c| seat_json(210 + c, "B", c, "Couple", 150_000)));
    room[4]["status"] = json!("RESERVED");
    Mock::given(method("GET"))
        .and(path("/rooms/4/seats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(room)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/showtimes/99/seats"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

fn app(server: &MockServer) -> Router {
    let base_url = server.uri();
    let config = Config::from_lookup(|key| match key {
        "INVENTORY_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    let inventory = InventoryClient::from_config(&config.inventory, &config.circuit_breaker).unwrap();
    build_router(AppState::with_parts(config, inventory, CacheService::disabled()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_flow(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/flows", Some(json!({ "showtime_id": 12 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check() {
    let server = inventory().await;
    let response = app(&server)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn seat_map_groups_couple_seats() {
    let server = inventory().await;
    let app = app(&server);

    let (status, map) = send(&app, Method::GET, "/api/showtimes/12/seat-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(map["row_count"], 2);
    assert_eq!(map["column_count"], 10);

    let couple_row = &map["rows"][1];
    assert_eq!(couple_row["couple"], true);
    let labels: Vec<&str> = couple_row["units"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["B1", "B3", "B5", "B7"]);
}

#[tokio::test]
async fn selecting_a_partner_seat_selects_the_pair() {
    let server = inventory().await;
    let app = app(&server);
    let id = create_flow(&app).await;

    let (status, flow) = send(
        &app,
        Method::PATCH,
        &format!("/api/flows/{id}/seats"),
        Some(json!({ "seat_id": 102 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["seat_labels"], json!(["B1"]));
    assert_eq!(flow["occupants"], 2);
    assert_eq!(flow["seat_total"], "150000");

    let (_, map) = send(
        &app,
        Method::GET,
        &format!("/api/showtimes/12/seat-map?flow_id={id}"),
        None,
    )
    .await;
    assert_eq!(map["rows"][1]["units"][0]["status"], "SELECTED");
    assert_eq!(map["rows"][1]["units"][1]["status"], "EMPTY");
}

#[tokio::test]
async fn capacity_is_enforced_with_couples_counting_twice() {
    let server = inventory().await;
    let app = app(&server);
    let id = create_flow(&app).await;
    let uri = format!("/api/flows/{id}/seats");

    for seat_id in [101, 103, 105, 107] {
        let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "seat_id": seat_id }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, error) = send(&app, Method::PATCH, &uri, Some(json!({ "seat_id": 1 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "CAPACITY_EXCEEDED");

    let (_, flow) = send(&app, Method::GET, &format!("/api/flows/{id}"), None).await;
    assert_eq!(flow["occupants"], 8);
}

#[tokio::test]
async fn hold_then_checkout() {
    let server = inventory().await;
    let app = app(&server);
    let id = create_flow(&app).await;

    send(&app, Method::PATCH, &format!("/api/flows/{id}/seats"), Some(json!({ "seat_id": 101 }))).await;
    let (status, flow) = send(
        &app,
        Method::PUT,
        &format!("/api/flows/{id}/combos"),
        Some(json!({ "combo_id": 1, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["total"], "250000");

    let (status, flow) = send(&app, Method::POST, &format!("/api/flows/{id}/hold"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "checkout");
    assert_eq!(flow["hold"]["status"], "active");
    assert_eq!(flow["hold"]["seat_ids"], json!([101, 102]));
    assert_eq!(flow["hold"]["remaining_seconds"], 300);

    let (status, flow) = send(&app, Method::POST, &format!("/api/flows/{id}/complete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "completed");
    assert_eq!(flow["hold"]["status"], "released");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/flows/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/flows/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hold_without_selection_is_rejected() {
    let server = inventory().await;
    let app = app(&server);
    let id = create_flow(&app).await;

    let (status, error) = send(&app, Method::POST, &format!("/api/flows/{id}/hold"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "EMPTY_SELECTION");
}

#[tokio::test]
async fn unknown_showtime_and_bad_input() {
    let server = inventory().await;
    let app = app(&server);

    let (status, _) = send(&app, Method::POST, "/api/flows", Some(json!({ "showtime_id": 99 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, error) = send(&app, Method::POST, "/api/flows", Some(json!({ "showtime_id": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn room_seat_map_shows_pairs_and_their_status() {
    let server = inventory().await;
    let app = app(&server);

    let (status, map) = send(&app, Method::GET, "/api/rooms/4/seat-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(map["row_count"], 2);
    assert_eq!(map["column_count"], 4);
    assert_eq!(map["couple_row_width"], 2);

    let units = map["rows"][1]["units"].as_array().unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0]["label"], "B1");
    assert_eq!(units[0]["seat_ids"], json!([211, 212]));
    assert_eq!(units[0]["status"], "RESERVED");
    assert_eq!(units[1]["status"], "EMPTY");

    let (status, _) = send(&app, Method::GET, "/api/rooms/5/seat-map", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concessions_lock_the_seats_until_going_back() {
    let server = inventory().await;
    let app = app(&server);
    let id = create_flow(&app).await;
    let seats = format!("/api/flows/{id}/seats");
    let concessions = format!("/api/flows/{id}/concessions");

    let (status, error) = send(&app, Method::POST, &concessions, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "EMPTY_SELECTION");

    send(&app, Method::PATCH, &seats, Some(json!({ "seat_id": 1 }))).await;
    let (status, flow) = send(&app, Method::POST, &concessions, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "concessions");

    let (status, error) = send(&app, Method::PATCH, &seats, Some(json!({ "seat_id": 2 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "INVALID_STATE");

    let (status, flow) = send(
        &app,
        Method::PUT,
        &format!("/api/flows/{id}/combos"),
        Some(json!({ "combo_id": 1, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["total"], "125000");

    let (status, flow) =
        send(&app, Method::POST, &format!("/api/flows/{id}/seat-selection"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "seat_selection");

    let (status, flow) = send(&app, Method::PATCH, &seats, Some(json!({ "seat_id": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["selected_seat_ids"], json!([1, 2]));
}

#[tokio::test]
async fn seat_toggled_while_hold_is_placed_blocks_checkout() {
    let slow_hold = ResponseTemplate::new(200).set_delay(Duration::from_millis(500));
    let server = inventory_with_hold(slow_hold).await;
    let app = app(&server);
    let id = create_flow(&app).await;
    let seats = format!("/api/flows/{id}/seats");
    let hold = format!("/api/flows/{id}/hold");

    send(&app, Method::PATCH, &seats, Some(json!({ "seat_id": 101 }))).await;

    let toggle_during_hold = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        send(&app, Method::PATCH, &seats, Some(json!({ "seat_id": 1 }))).await
    };
    let ((hold_status, error), (toggle_status, _)) =
        tokio::join!(send(&app, Method::POST, &hold, None), toggle_during_hold);

    assert_eq!(toggle_status, StatusCode::OK);
    assert_eq!(hold_status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "SELECTION_CHANGED");
    assert_eq!(error["retryable"], true);

    let (_, flow) = send(&app, Method::GET, &format!("/api/flows/{id}"), None).await;
    assert_eq!(flow["step"], "seat_selection");
    assert!(flow["hold"].is_null());
    assert_eq!(flow["selected_seat_ids"], json!([101, 1]));

    // новая бронь покрывает весь текущий выбор
    let (status, flow) = send(&app, Method::POST, &hold, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["step"], "checkout");
    assert_eq!(flow["hold"]["seat_ids"], json!([101, 102, 1]));
}
