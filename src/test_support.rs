//! In-process stand-in for the tour-booking backend, used by tests.
//!
//! Serves a fixed catalogue over real HTTP on an ephemeral port and records
//! what the client sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::api::types::Tour;

/// Token issued on a successful login.
pub const VALID_TOKEN: &str = "tok-valid";
/// Token issued on a successful registration.
pub const REGISTERED_TOKEN: &str = "tok-registered";
/// The only password the stub accepts.
pub const PASSWORD: &str = "secret";
/// An email the stub reports as already registered.
pub const TAKEN_EMAIL: &str = "taken@example.com";

#[derive(Default)]
struct Recorded {
    authorization: Vec<Option<String>>,
    login_bodies: Vec<Value>,
}

#[derive(Clone)]
struct StubState {
    recorded: Arc<Mutex<Recorded>>,
    delay: Duration,
}

/// A running stub backend.
pub struct StubBackend {
    pub base_url: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl StubBackend {
    pub async fn spawn() -> Self {
        Self::spawn_with_delay(Duration::ZERO).await
    }

    /// Spawn a backend that waits `delay` before answering any request.
    pub async fn spawn_with_delay(delay: Duration) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = StubState {
            recorded: Arc::clone(&recorded),
            delay,
        };

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/profile", get(profile))
            .route("/tours", get(list_tours))
            .route("/tours/popular", get(popular_tours))
            .route("/tours/hot", get(hot_tours))
            .route("/tours/search", get(search_tours))
            .route("/tours/filter", get(filter_tours))
            .route("/tours/{id}", get(get_tour))
            .route("/bookings", post(create_booking))
            .route("/bookings/my", get(my_bookings))
            .route("/bookings/{id}/cancel", post(cancel_booking))
            .route("/requests/", post(create_request))
            .route("/requests/my", get(my_requests))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            recorded,
        }
    }

    /// Authorization header of every request received, in order.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.recorded.lock().unwrap().authorization.clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.recorded.lock().unwrap().authorization.len()
    }

    /// JSON bodies posted to the login endpoint.
    pub fn login_bodies(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().login_bodies.clone()
    }
}

/// The fixed catalogue the stub serves.
pub fn sample_tours() -> Vec<Tour> {
    serde_json::from_value(catalogue()).unwrap()
}

fn catalogue() -> Value {
    json!([
        {
            "id": 1,
            "title": "Гастрономический тур по Москве",
            "description": "Откройте для себя лучшие рестораны и кафе столицы",
            "price": 5000.0,
            "duration": 3,
            "image_url": "/images/moscow-food.jpg",
            "category": "Гастрономический",
            "location": "Москва",
            "rating": 4.8,
            "available_spots": 10,
            "is_hot": false
        },
        {
            "id": 2,
            "title": "Винный тур по Крыму",
            "description": "Посещение лучших виноделен и дегустация местных вин",
            "price": 8000.0,
            "duration": 5,
            "image_url": "/images/crimea-wine.jpg",
            "category": "Винный",
            "location": "Крым",
            "rating": 4.9,
            "available_spots": 4,
            "is_hot": true
        },
        {
            "id": 3,
            "title": "Кулинарный мастер-класс в Санкт-Петербурге",
            "description": "Научитесь готовить блюда русской кухни у лучших шеф-поваров",
            "price": 3000.0,
            "duration": 1,
            "image_url": "/images/spb-cooking.jpg",
            "category": "Мастер-класс",
            "location": "Санкт-Петербург",
            "rating": 4.7,
            "available_spots": 8,
            "is_hot": false
        },
        {
            "id": 4,
            "title": "Фермерские выходные",
            "description": "Сыроварни и пасеки Подмосковья",
            "price": 10000.0,
            "duration": 2,
            "image_url": "/images/farm.jpg",
            "category": "Фермерский",
            "location": "Подмосковье",
            "rating": 4.5,
            "available_spots": 0,
            "is_hot": true
        }
    ])
}

fn tours_where(pred: impl Fn(&Value) -> bool) -> Value {
    let all = catalogue();
    let tours: Vec<Value> = all
        .as_array()
        .into_iter()
        .flatten()
        .filter(|t| pred(*t))
        .cloned()
        .collect();
    Value::Array(tours)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    let expected = [
        format!("Bearer {}", VALID_TOKEN),
        format!("Bearer {}", REGISTERED_TOKEN),
    ];
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| expected.iter().any(|e| e == v))
}

fn booking(id: i64, tour_id: i64, date: &str, participants: i64, status: &str) -> Value {
    let price = catalogue()
        .as_array()
        .and_then(|tours| tours.iter().find(|t| t["id"] == tour_id))
        .and_then(|t| t["price"].as_f64())
        .unwrap_or(0.0);
    json!({
        "id": id,
        "tour_id": tour_id,
        "user_id": 1,
        "date": date,
        "status": status,
        "participants": participants,
        "total_price": price * participants as f64
    })
}

async fn record_request(State(state): State<StubState>, request: Request, next: Next) -> Response {
    let auth = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.recorded.lock().unwrap().authorization.push(auth);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    next.run(request).await
}

async fn login(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.recorded.lock().unwrap().login_bodies.push(body.clone());
    if body["password"] == PASSWORD {
        Json(json!({ "access_token": VALID_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Incorrect email or password")
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"] == TAKEN_EMAIL {
        detail(StatusCode::BAD_REQUEST, "Email already registered")
    } else {
        Json(json!({ "access_token": REGISTERED_TOKEN, "token_type": "bearer" })).into_response()
    }
}

async fn profile(headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({
        "id": 1,
        "username": "ivan",
        "email": "user@example.com",
        "is_active": true,
        "is_admin": false,
        "created_at": "2026-01-01T00:00:00"
    }))
    .into_response()
}

async fn list_tours() -> Json<Value> {
    Json(catalogue())
}

async fn popular_tours() -> Json<Value> {
    Json(tours_where(|t| t["available_spots"].as_i64().unwrap_or(0) >= 5))
}

async fn hot_tours() -> Json<Value> {
    Json(tours_where(|t| t["is_hot"] == true))
}

async fn search_tours(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default().to_lowercase();
    Json(tours_where(|t| {
        let title = t["title"].as_str().unwrap_or_default().to_lowercase();
        let description = t["description"].as_str().unwrap_or_default().to_lowercase();
        title.contains(&q) || description.contains(&q)
    }))
}

async fn filter_tours(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let max_price = params.get("max_price").and_then(|p| p.parse::<f64>().ok());
    let category = params.get("category").cloned();
    Json(tours_where(|t| {
        let price = t["price"].as_f64().unwrap_or(0.0);
        max_price.map_or(true, |max| price <= max)
            && category.as_deref().map_or(true, |c| t["category"] == c)
    }))
}

async fn get_tour(Path(id): Path<i64>) -> Response {
    let found = tours_where(|t| t["id"] == id);
    match found.as_array().and_then(|tours| tours.first()) {
        Some(tour) => Json(tour.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Tour not found"),
    }
}

async fn create_booking(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    let tour_id = body["tour_id"].as_i64().unwrap_or(0);
    let date = body["date"].as_str().unwrap_or_default();
    let participants = body["participants"].as_i64().unwrap_or(1);
    Json(booking(42, tour_id, date, participants, "pending")).into_response()
}

async fn my_bookings(headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!([
        booking(41, 3, "2026-05-01", 1, "confirmed"),
        booking(42, 1, "2026-06-01", 2, "pending")
    ]))
    .into_response()
}

async fn cancel_booking(headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    if id == 999 {
        return detail(StatusCode::NOT_FOUND, "Booking not found");
    }
    Json(booking(id, 1, "2026-06-01", 2, "cancelled")).into_response()
}

fn travel_request(id: i64, tour_id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "tour_id": tour_id,
        "user_id": 1,
        "status": status,
        "created_at": "2026-03-01T10:00:00",
        "updated_at": "2026-03-01T10:00:00",
        "guest_name": null,
        "guest_email": null,
        "guest_phone": null,
        "comment": null
    })
}

async fn create_request(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    let tour_id = body["tour_id"].as_i64().unwrap_or(0);
    let found = tours_where(|t| t["id"] == tour_id);
    let Some(tour) = found.as_array().and_then(|tours| tours.first()) else {
        return detail(StatusCode::NOT_FOUND, "Tour not found");
    };
    if tour["available_spots"].as_i64().unwrap_or(0) <= 0 {
        return detail(StatusCode::BAD_REQUEST, "No available spots for this tour");
    }
    Json(travel_request(7, tour_id, "pending")).into_response()
}

async fn my_requests(headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!([
        travel_request(5, 1, "approved"),
        travel_request(7, 2, "pending")
    ]))
    .into_response()
}
