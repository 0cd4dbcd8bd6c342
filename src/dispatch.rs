use crate::api::{AirQualityService, GeocodingService};
use crate::app::Action;
use crate::events::Event;
use crate::location::Geolocator;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Runs controller [`Action`]s on background tasks.
///
/// Each action gets its own task and posts exactly one [`Event`] back to the
/// main loop. Nothing is cancelled; superseded results are filtered by the
/// controller using the generation they carry.
#[derive(Clone)]
pub struct Dispatcher {
    geocoder: Arc<dyn GeocodingService>,
    air_quality: Arc<dyn AirQualityService>,
    locator: Arc<dyn Geolocator>,
    tx: UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(
        geocoder: Arc<dyn GeocodingService>,
        air_quality: Arc<dyn AirQualityService>,
        locator: Arc<dyn Geolocator>,
        tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            geocoder,
            air_quality,
            locator,
            tx,
        }
    }

    pub fn dispatch_all(&self, actions: Vec<Action>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    pub fn dispatch(&self, action: Action) {
        let tx = self.tx.clone();
        match action {
            Action::Locate => {
                let locator = Arc::clone(&self.locator);
                tokio::spawn(async move {
                    let result = locator.locate().await;
                    tx.send(Event::Located(result)).ok();
                });
            }
            Action::Geocode { generation, query } => {
                let geocoder = Arc::clone(&self.geocoder);
                tokio::spawn(async move {
                    debug!("Geocode #{} for {:?}", generation, query.q_param());
                    let result = geocoder.search(&query).await;
                    tx.send(Event::Candidates { generation, result }).ok();
                });
            }
            Action::FetchAirQuality { generation, coords } => {
                let air_quality = Arc::clone(&self.air_quality);
                tokio::spawn(async move {
                    debug!("Air quality #{} for {}", generation, coords);
                    let result = air_quality.current(coords).await;
                    tx.send(Event::AirQuality { generation, result }).ok();
                });
            }
        }
    }
}
