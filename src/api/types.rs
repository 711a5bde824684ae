//! Request and response types for the tour-booking REST API.
//!
//! Field names follow the backend's JSON (snake_case), so no renaming is needed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token issued by `POST /auth/login` and `POST /auth/register`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthToken {
    /// The opaque bearer token.
    pub access_token: String,
    /// Token type, always `"bearer"` in practice.
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Login credentials, sent as JSON.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Registration payload for `POST /auth/register`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterData {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for RegisterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterData")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// The authenticated user.
///
/// Returned by `GET /auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_true() -> bool {
    true
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.username, self.email)
    }
}

/// A sellable tour package.
///
/// Both listing and detail endpoints return this shape. Fields that only the
/// detail view carries are optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tour {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    /// Duration in days.
    pub duration: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub available_spots: Option<u32>,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub departure_date: Option<String>,
    #[serde(default)]
    pub return_date: Option<String>,
    #[serde(default)]
    pub available_dates: Vec<String>,
}

impl Tour {
    /// Check whether the tour still has free places.
    ///
    /// Tours without spot tracking are treated as available.
    pub fn has_availability(&self) -> bool {
        self.available_spots.map_or(true, |spots| spots > 0)
    }
}

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.title)
    }
}

/// Server-side filter parameters for `GET /tours/filter`.
///
/// Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TourFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot: Option<bool>,
}

/// Booking lifecycle state. Transitions are owned by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A reservation of a tour by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub tour_id: i64,
    pub user_id: i64,
    /// Travel date, ISO-8601.
    pub date: String,
    pub status: BookingStatus,
    pub participants: u32,
    pub total_price: f64,
}

impl Booking {
    /// Whether the booking can still be cancelled by the client.
    pub fn is_cancellable(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Payload for `POST /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub tour_id: i64,
    pub date: String,
    pub participants: u32,
}

/// Review state of a travel request. Only an administrator moves it on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A request to join a tour, reviewed by the operator before it holds a spot.
///
/// Requests left by guests carry contact details instead of a `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TravelRequest {
    pub id: i64,
    pub tour_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_phone: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Payload for `POST /requests/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTravelRequest {
    pub tour_id: i64,
}
