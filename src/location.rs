//! Device location for the startup air-quality lookup.
//!
//! A terminal has no platform position API, so the "device location" is the
//! IP geolocation reported by IpApi. There is no default position: a failed
//! lookup asks the user to enter coordinates.

use crate::config::LocationConfig;
use crate::error::AppError;
use crate::models::CoordinatePair;
use async_trait::async_trait;
use ipgeolocate::{Locator, Service};
use tracing::{error, info};

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<CoordinatePair, AppError>;
}

pub struct IpGeolocator {
    config: LocationConfig,
}

impl IpGeolocator {
    pub fn new(config: LocationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    /// Resolves the approximate position of `lookup_ip` (or of this machine
    /// when empty) in decimal degrees (WGS84).
    async fn locate(&self) -> Result<CoordinatePair, AppError> {
        if !self.config.auto_detect {
            return Err(AppError::LocationUnavailable(
                "automatic detection disabled".to_string(),
            ));
        }

        match Locator::get(&self.config.lookup_ip, Service::IpApi).await {
            Ok(loc) => {
                let coords = parse_locator(&loc.latitude, &loc.longitude)?;
                info!("Geolocation successful - ({})", coords);
                Ok(coords)
            }
            Err(e) => {
                error!("Error using geolocation service: {}", e);
                Err(AppError::LocationUnavailable(e.to_string()))
            }
        }
    }
}

// IpApi reports coordinates as strings.
fn parse_locator(lat: &str, lon: &str) -> Result<CoordinatePair, AppError> {
    CoordinatePair::parse(lat, lon).map_err(|e| AppError::LocationUnavailable(e.to_string()))
}
