//! OpenWeather geocoding and air-pollution client.
//!
//! The controller only sees the [`GeocodingService`] and [`AirQualityService`]
//! traits, so tests can swap the HTTP client for in-memory fakes.

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{
    AirPollutionResponse, AirQualityReading, CoordinatePair, GeocodeEntry, PlaceCandidate,
    PlaceQuery,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Candidates in the order the service returned them.
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceCandidate>, AppError>;
}

#[async_trait]
pub trait AirQualityService: Send + Sync {
    async fn current(&self, coords: CoordinatePair) -> Result<AirQualityReading, AppError>;
}

pub struct OpenWeatherClient {
    client: Client,
    config: ApiConfig,
}

impl OpenWeatherClient {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, AppError> {
        if self.config.key.is_empty() {
            return Err(AppError::MissingApiKey);
        }
        Ok(self.config.key.as_str())
    }
}

/// Query pairs for the direct geocoding endpoint.
pub fn geocode_params(query: &PlaceQuery, limit: u32, key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.q_param()),
        ("limit", limit.to_string()),
        ("appid", key.to_string()),
    ]
}

/// Query pairs for the air-pollution endpoint; coordinates go out at 4 decimals.
pub fn air_quality_params(coords: CoordinatePair, key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.lat_param()),
        ("lon", coords.lon_param()),
        ("appid", key.to_string()),
    ]
}

#[async_trait]
impl GeocodingService for OpenWeatherClient {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceCandidate>, AppError> {
        let params = geocode_params(query, self.config.geocode_limit, self.api_key()?);
        debug!("Geocoding {:?}", query.q_param());

        let entries = self
            .client
            .get(&self.config.geocode_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<GeocodeEntry>>()
            .await?;

        Ok(entries.into_iter().map(PlaceCandidate::from).collect())
    }
}

#[async_trait]
impl AirQualityService for OpenWeatherClient {
    async fn current(&self, coords: CoordinatePair) -> Result<AirQualityReading, AppError> {
        let params = air_quality_params(coords, self.api_key()?);
        debug!("Fetching air quality for {}", coords);

        let res = self
            .client
            .get(&self.config.air_quality_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<AirPollutionResponse>()
            .await?;

        AirQualityReading::try_from(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SERVICE_FAILURE_MSG;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers a single request with `status` and `body`; yields the request line.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (base, handle)
    }

    fn client_for(base: &str) -> OpenWeatherClient {
        OpenWeatherClient::new(ApiConfig {
            key: "k".into(),
            geocode_url: format!("{base}/geo"),
            air_quality_url: format!("{base}/air"),
            timeout_seconds: 5,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    fn bengaluru() -> CoordinatePair {
        CoordinatePair::new(12.9716, 77.5946).unwrap()
    }

    #[tokio::test]
    async fn air_quality_request_and_reading() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"list":[{"dt":1700000000,"main":{"aqi":2},"components":{"co":201.94,"no2":0.77}}]}"#,
        )
        .await;

        let reading = client_for(&base).current(bengaluru()).await.unwrap();
        assert_eq!(reading.aqi, 2);
        assert_eq!(reading.component_text("co"), "201.94 μg/m³");

        let request_line = server.await.unwrap();
        assert!(
            request_line.starts_with("GET /air?lat=12.9716&lon=77.5946&appid=k "),
            "{request_line}"
        );
    }

    #[tokio::test]
    async fn server_error_status_is_a_service_failure() {
        let (base, server) = serve_once("500 Internal Server Error", "{}").await;

        let err = client_for(&base).current(bengaluru()).await.unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "{err:?}");
        assert_eq!(err.user_message(), SERVICE_FAILURE_MSG);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_json_is_a_service_failure() {
        let (base, server) = serve_once("200 OK", r#"{"list":1"#).await;

        let err = client_for(&base).current(bengaluru()).await.unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "{err:?}");
        assert_eq!(err.user_message(), SERVICE_FAILURE_MSG);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn empty_reading_list_is_a_service_failure() {
        let (base, server) = serve_once("200 OK", r#"{"list":[]}"#).await;

        let err = client_for(&base).current(bengaluru()).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)), "{err:?}");
        assert_eq!(err.user_message(), SERVICE_FAILURE_MSG);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_a_service_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client_for(&base).current(bengaluru()).await.unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "{err:?}");
        assert_eq!(err.user_message(), SERVICE_FAILURE_MSG);

        let err = client_for(&base)
            .search(&PlaceQuery::new("Pune", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "{err:?}");
    }

    #[tokio::test]
    async fn geocoding_keeps_service_order_and_encodes_query() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[
                {"name":"São Paulo","state":"São Paulo","country":"BR","lat":-23.5505,"lon":-46.6333},
                {"name":"Null Island","country":"XX","lat":0,"lon":0},
                {"name":"São Paulo de Olivença","state":"Amazonas","country":"BR","lat":-3.3783,"lon":-68.8725}
            ]"#,
        )
        .await;

        let candidates = client_for(&base)
            .search(&PlaceQuery::new("São Paulo", "SP & x"))
            .await
            .unwrap();

        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["São Paulo", "Null Island", "São Paulo de Olivença"]);
        assert_eq!(
            candidates[1].coords,
            Some(CoordinatePair { latitude: 0.0, longitude: 0.0 })
        );

        let request_line = server.await.unwrap();
        assert!(
            request_line.starts_with("GET /geo?q=S%C3%A3o+Paulo%2CSP+%26+x&limit=5&appid=k "),
            "{request_line}"
        );
    }

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn geocode_params_without_region() {
        let params = geocode_params(&PlaceQuery::new("Mysuru", ""), 5, "k");
        assert_eq!(param(&params, "q"), Some("Mysuru"));
        assert_eq!(param(&params, "limit"), Some("5"));
        assert_eq!(param(&params, "appid"), Some("k"));
    }

    #[test]
    fn geocode_params_with_region() {
        let params = geocode_params(&PlaceQuery::new("Mysuru", "Karnataka"), 3, "k");
        assert_eq!(param(&params, "q"), Some("Mysuru,Karnataka"));
        assert_eq!(param(&params, "limit"), Some("3"));
    }

    #[test]
    fn air_quality_params_use_four_decimals() {
        let coords = CoordinatePair::new(12.97159, 77.5).unwrap();
        let params = air_quality_params(coords, "k");
        assert_eq!(param(&params, "lat"), Some("12.9716"));
        assert_eq!(param(&params, "lon"), Some("77.5000"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = OpenWeatherClient::new(ApiConfig {
            key: String::new(),
            // Unroutable on purpose: reaching the network would be a bug.
            geocode_url: "http://127.0.0.1:9/geo".into(),
            air_quality_url: "http://127.0.0.1:9/air".into(),
            ..ApiConfig::default()
        })
        .unwrap();

        let err = client.search(&PlaceQuery::new("Pune", "")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingApiKey));

        let coords = CoordinatePair::new(18.5204, 73.8567).unwrap();
        let err = client.current(coords).await.unwrap_err();
        assert!(matches!(err, AppError::MissingApiKey));
    }
}
