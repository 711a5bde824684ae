//! Tour-booking API client and types.
//!
//! This module provides the interface for communicating with the tour-booking
//! REST backend: one configured client, token storage, and typed endpoints.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod navigator;
pub mod types;

pub use auth::{FileStore, KeyringStore, MemoryStore, TokenStore};
pub use client::ApiClient;
pub use endpoints::{AuthApi, BookingsApi, RequestsApi, ToursApi};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use navigator::{Navigator, NoopNavigator, RecordingNavigator, LOGIN_PATH};
pub use types::{
    Booking, BookingStatus, RegisterData, RequestStatus, Tour, TourFilter, TravelRequest, User,
};
