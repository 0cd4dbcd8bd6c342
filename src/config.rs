use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

const CONFIG_PATH: &str = "config.toml";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub location: LocationConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub key: String,            // Overridden by OPENWEATHER_API_KEY when set
    pub geocode_url: String,    // Direct (name -> coordinates) geocoding endpoint
    pub air_quality_url: String,
    pub geocode_limit: u32,     // Max candidates per search (service caps at 5)
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LocationConfig {
    pub auto_detect: bool, // Try IP geolocation on startup
    pub lookup_ip: String, // Empty means "the caller's own address"
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub region_suggestions: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            geocode_url: "https://api.openweathermap.org/geo/1.0/direct".to_string(),
            air_quality_url: "https://api.openweathermap.org/data/2.5/air_pollution".to_string(),
            geocode_limit: 5,
            timeout_seconds: 10,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            lookup_ip: String::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 150,
            region_suggestions: [
                "Andhra Pradesh", "Arunachal Pradesh", "Assam", "Bihar", "Chhattisgarh",
                "Goa", "Gujarat", "Haryana", "Himachal Pradesh", "Jharkhand", "Karnataka",
                "Kerala", "Madhya Pradesh", "Maharashtra", "Manipur", "Meghalaya",
                "Mizoram", "Nagaland", "Odisha", "Punjab", "Rajasthan", "Sikkim",
                "Tamil Nadu", "Telangana", "Tripura", "Uttar Pradesh", "Uttarakhand",
                "West Bengal",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    /// The API key from the environment wins over the file.
    pub fn load() -> Self {
        let config = Self::load_file().with_api_key(std::env::var(API_KEY_ENV).ok());
        if config.api.key.is_empty() {
            warn!("No API key configured; set {} or api.key in {}", API_KEY_ENV, CONFIG_PATH);
        }
        config
    }

    fn load_file() -> Self {
        if let Ok(content) = fs::read_to_string(CONFIG_PATH) {
            match Self::from_toml(&content) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", CONFIG_PATH, e);
                    return Self::default();
                }
            }
        }

        let default_config = Self::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(CONFIG_PATH, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", CONFIG_PATH);
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.api.key = key;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [api]
            key = "from-file"

            [location]
            auto_detect = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.key, "from-file");
        assert_eq!(config.api.geocode_limit, 5);
        assert!(config.api.air_quality_url.ends_with("/data/2.5/air_pollution"));
        assert!(!config.location.auto_detect);
        assert_eq!(config.ui.tick_rate_ms, 150);
        assert_eq!(config.ui.region_suggestions.len(), 28);
    }

    #[test]
    fn environment_key_overrides_file() {
        let config = Config::default().with_api_key(Some("env-key".into()));
        assert_eq!(config.api.key, "env-key");

        let mut config = Config::default();
        config.api.key = "from-file".into();
        assert_eq!(config.clone().with_api_key(None).api.key, "from-file");
        assert_eq!(config.with_api_key(Some("  ".into())).api.key, "from-file");
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.api.geocode_url, ApiConfig::default().geocode_url);
        assert!(parsed.location.auto_detect);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml("[api\nkey = 1").is_err());
    }
}
