use crate::countries::CountryDirectory;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Pollutant keys shown in the results panel, in display order, with labels.
pub const TRACKED_POLLUTANTS: [(&str, &str); 8] = [
    ("co", "CO"),
    ("no", "NO"),
    ("no2", "NO₂"),
    ("o3", "O₃"),
    ("so2", "SO₂"),
    ("pm2_5", "PM2.5"),
    ("pm10", "PM10"),
    ("nh3", "NH₃"),
];

pub const CONCENTRATION_UNIT: &str = "μg/m³";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    pub latitude: f64,
    pub longitude: f64,
}

impl CoordinatePair {
    /// Builds a pair, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::InvalidCoordinates(format!("latitude {latitude}")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::InvalidCoordinates(format!("longitude {longitude}")));
        }
        Ok(Self { latitude, longitude })
    }

    /// Parses the text of the two coordinate fields.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, AppError> {
        let lat = parse_degrees(latitude)?;
        let lon = parse_degrees(longitude)?;
        Self::new(lat, lon)
    }

    pub fn lat_param(&self) -> String {
        format!("{:.4}", self.latitude)
    }

    pub fn lon_param(&self) -> String {
        format!("{:.4}", self.longitude)
    }
}

impl fmt::Display for CoordinatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

fn parse_degrees(text: &str) -> Result<f64, AppError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::InvalidCoordinates(format!("{trimmed:?}"))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
    pub name: String,
    pub region: Option<String>,
}

impl PlaceQuery {
    pub fn new(name: &str, region: &str) -> Self {
        let region = region.trim();
        Self {
            name: name.trim().to_string(),
            region: (!region.is_empty()).then(|| region.to_string()),
        }
    }

    /// Value of the geocoder's `q` parameter: `name` or `name,region`.
    pub fn q_param(&self) -> String {
        match &self.region {
            Some(region) => format!("{},{}", self.name, region),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub name: String,
    pub region: Option<String>,
    pub country_code: String,
    /// `None` when the geocoder omitted either coordinate; such entries are inert.
    pub coords: Option<CoordinatePair>,
}

impl PlaceCandidate {
    /// "name, region, Country" with the region skipped when absent.
    pub fn label(&self, countries: &CountryDirectory) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(region) = self.region.as_deref() {
            parts.push(region);
        }
        let country = countries.display_name(&self.country_code);
        if !country.is_empty() {
            parts.push(country);
        }
        parts.join(", ")
    }
}

/// One entry of the OpenWeather direct geocoding response.
#[derive(Debug, Deserialize)]
pub struct GeocodeEntry {
    pub name: String,
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl From<GeocodeEntry> for PlaceCandidate {
    fn from(entry: GeocodeEntry) -> Self {
        let coords = match (entry.lat, entry.lon) {
            (Some(lat), Some(lon)) => CoordinatePair::new(lat, lon).ok(),
            _ => None,
        };
        Self {
            name: entry.name,
            region: entry.state.filter(|s| !s.trim().is_empty()),
            country_code: entry.country,
            coords,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityReading {
    pub aqi: i64,
    pub components: BTreeMap<String, f64>,
    pub measured_at: Option<DateTime<Utc>>,
}

impl AirQualityReading {
    /// "<value> μg/m³", value rendered as delivered by the service.
    pub fn component_text(&self, key: &str) -> String {
        match self.components.get(key) {
            Some(value) => format!("{value} {CONCENTRATION_UNIT}"),
            None => format!("N/A {CONCENTRATION_UNIT}"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionResponse {
    #[serde(default)]
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionEntry {
    pub dt: Option<i64>,
    pub main: AirPollutionMain,
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionMain {
    pub aqi: i64,
}

impl TryFrom<AirPollutionResponse> for AirQualityReading {
    type Error = AppError;

    // Only the first entry matters; the current-conditions endpoint returns one.
    fn try_from(res: AirPollutionResponse) -> Result<Self, Self::Error> {
        let entry = res
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AppError::MalformedPayload("empty list".to_string()))?;

        Ok(Self {
            aqi: entry.main.aqi,
            components: entry.components,
            measured_at: entry.dt.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_finite_numbers_only() {
        let c = CoordinatePair::parse(" 12.9716", "77.5946 ").unwrap();
        assert_eq!(c.latitude, 12.9716);
        assert_eq!(c.longitude, 77.5946);

        for bad in ["abc", "", "   ", "NaN", "inf", "-inf", "12abc"] {
            assert!(
                matches!(
                    CoordinatePair::parse(bad, "0"),
                    Err(AppError::InvalidCoordinates(_))
                ),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert!(CoordinatePair::parse("90.5", "0").is_err());
        assert!(CoordinatePair::parse("0", "-180.1").is_err());
        assert!(CoordinatePair::parse("-90", "180").is_ok());
    }

    #[test]
    fn formats_four_fractional_digits() {
        let c = CoordinatePair::new(12.3, -7.0).unwrap();
        assert_eq!(c.lat_param(), "12.3000");
        assert_eq!(c.lon_param(), "-7.0000");
        assert_eq!(c.to_string(), "12.3000,-7.0000");

        let c = CoordinatePair::new(12.971598, 77.594566).unwrap();
        assert_eq!(c.to_string(), "12.9716,77.5946");
    }

    #[test]
    fn region_is_appended_only_when_present() {
        assert_eq!(PlaceQuery::new("Pune", "").q_param(), "Pune");
        assert_eq!(PlaceQuery::new("Pune", "   ").q_param(), "Pune");
        assert_eq!(
            PlaceQuery::new("Pune", "Maharashtra").q_param(),
            "Pune,Maharashtra"
        );
    }

    #[test]
    fn geocode_entry_without_coordinates_is_inert() {
        let entries: Vec<GeocodeEntry> = serde_json::from_str(
            r#"[
                {"name": "Springfield", "state": "Illinois", "country": "US", "lat": 39.7817, "lon": -89.6501},
                {"name": "Nowhere", "country": "ZZ"}
            ]"#,
        )
        .unwrap();
        let candidates: Vec<PlaceCandidate> = entries.into_iter().map(PlaceCandidate::from).collect();

        assert_eq!(candidates[0].region.as_deref(), Some("Illinois"));
        assert_eq!(
            candidates[0].coords,
            Some(CoordinatePair { latitude: 39.7817, longitude: -89.6501 })
        );
        assert_eq!(candidates[1].coords, None);
        assert_eq!(candidates[1].region, None);
    }

    #[test]
    fn label_resolves_country_and_falls_back_to_code() {
        let countries = CountryDirectory::embedded();
        let mut candidate = PlaceCandidate {
            name: "Bengaluru".into(),
            region: Some("Karnataka".into()),
            country_code: "IN".into(),
            coords: None,
        };
        assert_eq!(candidate.label(&countries), "Bengaluru, Karnataka, India");

        candidate.region = None;
        candidate.country_code = "XK".into();
        assert_eq!(candidate.label(&countries), "Bengaluru, XK");
    }

    #[test]
    fn reading_takes_first_entry() {
        let res: AirPollutionResponse = serde_json::from_str(
            r#"{"coord": {"lon": 77.5946, "lat": 12.9716},
                "list": [{"dt": 1700000000, "main": {"aqi": 2},
                          "components": {"co": 201.94, "no2": 0.77, "pm2_5": 0.5}}]}"#,
        )
        .unwrap();
        let reading = AirQualityReading::try_from(res).unwrap();

        assert_eq!(reading.aqi, 2);
        assert_eq!(reading.component_text("co"), "201.94 μg/m³");
        assert_eq!(reading.component_text("pm2_5"), "0.5 μg/m³");
        assert_eq!(reading.component_text("nh3"), "N/A μg/m³");
        assert_eq!(reading.measured_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn empty_list_is_malformed() {
        let res: AirPollutionResponse = serde_json::from_str(r#"{"list": []}"#).unwrap();
        assert!(matches!(
            AirQualityReading::try_from(res),
            Err(AppError::MalformedPayload(_))
        ));
    }
}
