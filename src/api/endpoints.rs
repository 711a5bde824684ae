//! Typed wrappers over the backend's REST endpoints.
//!
//! Each wrapper maps a semantic operation to one HTTP verb and path. They
//! hold no state beyond a handle to the shared [`ApiClient`], so both
//! interceptors apply to every call.
//!
//! Login credentials are always sent as a JSON body `{email, password}`.

use tracing::{debug, instrument};

use super::client::ApiClient;
use super::error::Result;
use super::types::{
    AuthToken, Booking, LoginData, NewBooking, NewTravelRequest, RegisterData, Tour, TourFilter,
    TravelRequest, User,
};

/// Authentication endpoints under `/auth`.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /auth/login`
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let body = LoginData {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.client.post("/auth/login", &body).await
    }

    /// `POST /auth/register`
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn register(&self, data: &RegisterData) -> Result<AuthToken> {
        self.client.post("/auth/register", data).await
    }

    /// `GET /auth/profile`
    pub async fn profile(&self) -> Result<User> {
        self.client.get("/auth/profile").await
    }
}

/// Tour catalogue endpoints under `/tours`.
#[derive(Debug, Clone)]
pub struct ToursApi {
    client: ApiClient,
}

impl ToursApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /tours`
    pub async fn all(&self) -> Result<Vec<Tour>> {
        let tours: Vec<Tour> = self.client.get("/tours").await?;
        debug!("Fetched {} tours", tours.len());
        Ok(tours)
    }

    /// `GET /tours/popular`
    pub async fn popular(&self) -> Result<Vec<Tour>> {
        self.client.get("/tours/popular").await
    }

    /// `GET /tours/hot`
    pub async fn hot(&self) -> Result<Vec<Tour>> {
        self.client.get("/tours/hot").await
    }

    /// `GET /tours/{id}`
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Tour> {
        self.client.get(&format!("/tours/{}", id)).await
    }

    /// `GET /tours/search?q=`
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Tour>> {
        let path = format!("/tours/search?q={}", urlencoding::encode(query));
        self.client.get(&path).await
    }

    /// `GET /tours/filter?...`
    #[instrument(skip(self))]
    pub async fn filter(&self, filter: &TourFilter) -> Result<Vec<Tour>> {
        self.client.get_with_query("/tours/filter", filter).await
    }
}

/// Booking endpoints under `/bookings`.
///
/// Every call requires a session; status transitions are owned by the backend.
#[derive(Debug, Clone)]
pub struct BookingsApi {
    client: ApiClient,
}

impl BookingsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /bookings`
    #[instrument(skip(self))]
    pub async fn create(&self, tour_id: i64, date: &str, participants: u32) -> Result<Booking> {
        let body = NewBooking {
            tour_id,
            date: date.to_string(),
            participants,
        };
        self.client.post("/bookings", &body).await
    }

    /// `GET /bookings/my`
    pub async fn mine(&self) -> Result<Vec<Booking>> {
        self.client.get("/bookings/my").await
    }

    /// `POST /bookings/{id}/cancel`
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: i64) -> Result<Booking> {
        self.client.post_empty(&format!("/bookings/{}/cancel", id)).await
    }
}

/// Travel request endpoints under `/requests`.
///
/// Only the signed-in user's own requests are reachable here; listing every
/// request and changing its status are left to the operator's tools.
#[derive(Debug, Clone)]
pub struct RequestsApi {
    client: ApiClient,
}

impl RequestsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /requests/`
    #[instrument(skip(self))]
    pub async fn create(&self, tour_id: i64) -> Result<TravelRequest> {
        self.client
            .post("/requests/", &NewTravelRequest { tour_id })
            .await
    }

    /// `GET /requests/my`
    pub async fn mine(&self) -> Result<Vec<TravelRequest>> {
        self.client.get("/requests/my").await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::auth::{MemoryStore, TokenStore};
    use crate::api::error::ApiError;
    use crate::api::types::{BookingStatus, RequestStatus};
    use crate::test_support::{StubBackend, PASSWORD, TAKEN_EMAIL, VALID_TOKEN};

    fn client(backend: &StubBackend, store: Arc<MemoryStore>) -> ApiClient {
        ApiClient::new(&backend.base_url, store).unwrap()
    }

    #[tokio::test]
    async fn test_login_sends_json_credentials() {
        let backend = StubBackend::spawn().await;
        let auth = AuthApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let token = auth.login("user@example.com", PASSWORD).await.unwrap();

        assert_eq!(token.access_token, VALID_TOKEN);
        assert_eq!(token.token_type, "bearer");
        let bodies = backend.login_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["email"], "user@example.com");
        assert_eq!(bodies[0]["password"], PASSWORD);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_surfaces_detail() {
        let backend = StubBackend::spawn().await;
        let auth = AuthApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let err = auth
            .register(&RegisterData::new("ivan", TAKEN_EMAIL, "pw"))
            .await
            .unwrap_err();

        match err {
            ApiError::Rejected { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Email already registered");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tour_listings() {
        let backend = StubBackend::spawn().await;
        let tours = ToursApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let all = tours.all().await.unwrap();
        let popular = tours.popular().await.unwrap();
        let hot = tours.hot().await.unwrap();

        assert_eq!(all.len(), 4);
        assert!(popular.len() <= all.len());
        assert!(hot.iter().all(|t| t.is_hot));
    }

    #[tokio::test]
    async fn test_get_tour_by_id() {
        let backend = StubBackend::spawn().await;
        let tours = ToursApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let tour = tours.get(2).await.unwrap();
        assert_eq!(tour.id, 2);

        let err = tours.get(999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let backend = StubBackend::spawn().await;
        let tours = ToursApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let found = tours.search("винный тур").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[tokio::test]
    async fn test_filter_sends_only_set_params() {
        let backend = StubBackend::spawn().await;
        let tours = ToursApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let filter = TourFilter {
            max_price: Some(5000.0),
            ..Default::default()
        };
        let found = tours.filter(&filter).await.unwrap();

        assert!(!found.is_empty());
        assert!(found.iter().all(|t| t.price <= 5000.0));
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let backend = StubBackend::spawn().await;
        let store = Arc::new(MemoryStore::with_token(VALID_TOKEN));
        let bookings = BookingsApi::new(client(&backend, store.clone()));

        let created = bookings.create(1, "2026-06-01", 2).await.unwrap();
        assert_eq!(created.tour_id, 1);
        assert_eq!(created.participants, 2);
        assert_eq!(created.status, BookingStatus::Pending);

        let mine = bookings.mine().await.unwrap();
        assert!(!mine.is_empty());

        let cancelled = bookings.cancel(created.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(store.has_token());
    }

    #[tokio::test]
    async fn test_bookings_require_session() {
        let backend = StubBackend::spawn().await;
        let bookings = BookingsApi::new(client(&backend, Arc::new(MemoryStore::new())));

        let err = bookings.mine().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_travel_request_lifecycle() {
        let backend = StubBackend::spawn().await;
        let requests = RequestsApi::new(client(&backend, Arc::new(MemoryStore::with_token(VALID_TOKEN))));

        let created = requests.create(2).await.unwrap();
        assert_eq!(created.tour_id, 2);
        assert_eq!(created.status, RequestStatus::Pending);

        let mine = requests.mine().await.unwrap();
        assert!(mine.iter().any(|r| r.tour_id == 2));
    }

    #[tokio::test]
    async fn test_travel_request_for_full_tour_is_rejected() {
        let backend = StubBackend::spawn().await;
        let requests = RequestsApi::new(client(&backend, Arc::new(MemoryStore::with_token(VALID_TOKEN))));

        match requests.create(4).await.unwrap_err() {
            ApiError::Rejected { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "No available spots for this tour");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
        assert!(matches!(
            requests.create(999).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_travel_requests_require_session() {
        let backend = StubBackend::spawn().await;
        let store = Arc::new(MemoryStore::with_token("tok-revoked"));
        let requests = RequestsApi::new(client(&backend, store.clone()));

        let err = requests.mine().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!store.has_token());
    }
}
