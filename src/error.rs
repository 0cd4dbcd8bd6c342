//! Error types shared by the lookup services and the controller.
//!
//! Every failure ends up in the single status line of the UI, so each
//! variant knows the exact sentence a user should see via
//! [`AppError::user_message`].

use thiserror::Error;

pub const INVALID_COORDINATES_MSG: &str = "Please enter valid coordinates.";
pub const LOCATION_UNAVAILABLE_MSG: &str = "Can't access your location. Please enter your coordinates.";
pub const SERVICE_FAILURE_MSG: &str = "Something went wrong. Check your internet connection.";

#[derive(Error, Debug)]
pub enum AppError {
    /// Coordinate text that is not a finite number or is out of range.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Geolocation is disabled or the lookup failed.
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// Transport failure or non-success status from a remote service.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response decoded but did not contain what we need.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("API key not configured")]
    MissingApiKey,
}

impl AppError {
    /// The sentence shown in the status line for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidCoordinates(_) => INVALID_COORDINATES_MSG,
            AppError::LocationUnavailable(_) => LOCATION_UNAVAILABLE_MSG,
            AppError::Http(_) | AppError::MalformedPayload(_) | AppError::MissingApiKey => {
                SERVICE_FAILURE_MSG
            }
        }
    }
}
