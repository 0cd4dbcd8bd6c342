use crate::aqi::{self, AqiLevel};
use crate::config::Config;
use crate::countries::CountryDirectory;
use crate::error::{AppError, INVALID_COORDINATES_MSG};
use crate::events::Event;
use crate::models::{AirQualityReading, CoordinatePair, PlaceCandidate, PlaceQuery};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, error, info, warn};

/// Focus stops of the lookup form, in Tab order.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum Field {
    #[default]
    Latitude,
    Longitude,
    PlaceName,
    Region,
    Search,
}

impl Field {
    const ORDER: [Field; 5] = [
        Field::Latitude,
        Field::Longitude,
        Field::PlaceName,
        Field::Region,
        Field::Search,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[self
            .position()
            .checked_sub(1)
            .unwrap_or(Self::ORDER.len() - 1)]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
            Field::PlaceName => "Place",
            Field::Region => "State / Region (optional)",
            Field::Search => "Search",
        }
    }
}

/// Side effects requested by the controller; run by the
/// [`Dispatcher`](crate::dispatch::Dispatcher).
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Locate,
    Geocode { generation: u64, query: PlaceQuery },
    FetchAirQuality { generation: u64, coords: CoordinatePair },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GeocodeStatus {
    #[default]
    Idle,
    Searching,
    NoMatches,
    Failed,
}

/// State of the lookup screen and the single owner of everything drawn.
///
/// Handlers never perform I/O; they mutate state and return the [`Action`]s
/// to run. Each request carries a generation number and a response is only
/// applied when it matches the latest one issued for its kind.
#[derive(Default)]
pub struct App {
    pub focus: Field,
    pub latitude: String,
    pub longitude: String,
    pub place_name: String,
    pub region: String,

    /// Shared error/hint label; empty when there is nothing to report.
    pub error: String,

    pub candidates: Vec<PlaceCandidate>,
    pub highlighted: usize,
    pub geocode_status: GeocodeStatus,

    pub reading: Option<AirQualityReading>,
    pub panel_visible: bool,
    pub locating: bool,
    pub fetching: bool,

    pub tick_count: usize,
    pub should_quit: bool,

    pub countries: CountryDirectory,
    region_suggestions: Vec<String>,
    geocode_generation: u64,
    air_generation: u64,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let countries = CountryDirectory::embedded();
        debug!("Loaded {} country names", countries.len());
        Self {
            countries,
            region_suggestions: config.ui.region_suggestions.clone(),
            ..Self::default()
        }
    }

    /// Startup: try the device location once.
    pub fn startup(&mut self) -> Vec<Action> {
        self.locating = true;
        vec![Action::Locate]
    }

    pub fn handle_event(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::Tick => {
                self.on_tick();
                Vec::new()
            }
            Event::Input(key) => self.handle_key(key),
            Event::Located(result) => self.on_located(result),
            Event::Candidates { generation, result } => {
                self.on_candidates(generation, result);
                Vec::new()
            }
            Event::AirQuality { generation, result } => {
                self.on_air_quality(generation, result);
                Vec::new()
            }
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('c') = key.code {
                self.should_quit = true;
            }
            return Vec::new();
        }

        // The results popup is modal.
        if self.panel_visible {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.close_panel();
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Esc => self.dismiss_candidates(),
            KeyCode::Down if self.focus == Field::PlaceName && !self.candidates.is_empty() => {
                self.highlighted = (self.highlighted + 1) % self.candidates.len();
            }
            KeyCode::Up if self.focus == Field::PlaceName && !self.candidates.is_empty() => {
                self.highlighted = self
                    .highlighted
                    .checked_sub(1)
                    .unwrap_or(self.candidates.len() - 1);
            }
            KeyCode::Right | KeyCode::End if self.focus == Field::Region => {
                self.accept_region_completion();
            }
            KeyCode::Enter => {
                return match self.focus {
                    Field::Latitude | Field::Longitude | Field::Search => self.submit(),
                    Field::PlaceName => self.select_highlighted(),
                    Field::Region => self.search_place(),
                };
            }
            KeyCode::Char(' ') if self.focus == Field::Search => return self.submit(),
            KeyCode::Backspace => {
                if let Some(text) = self.focused_text_mut() {
                    text.pop();
                    return self.after_edit();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.focused_text_mut() {
                    text.push(c);
                    return self.after_edit();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Latitude => Some(&mut self.latitude),
            Field::Longitude => Some(&mut self.longitude),
            Field::PlaceName => Some(&mut self.place_name),
            Field::Region => Some(&mut self.region),
            Field::Search => None,
        }
    }

    fn after_edit(&mut self) -> Vec<Action> {
        if self.focus == Field::PlaceName {
            self.search_place()
        } else {
            Vec::new()
        }
    }

    /// Manual coordinate submission from the two coordinate fields.
    pub fn submit(&mut self) -> Vec<Action> {
        match CoordinatePair::parse(&self.latitude, &self.longitude) {
            Ok(coords) => {
                self.error.clear();
                self.fetch_air_quality(coords)
            }
            Err(e) => {
                debug!("Rejected manual coordinates: {}", e);
                self.error = INVALID_COORDINATES_MSG.to_string();
                Vec::new()
            }
        }
    }

    /// Starts a geocoding search for the current place name and region.
    /// The previous candidate list is discarded either way.
    pub fn search_place(&mut self) -> Vec<Action> {
        self.geocode_generation += 1;
        self.candidates.clear();
        self.highlighted = 0;

        if self.place_name.trim().is_empty() {
            self.geocode_status = GeocodeStatus::Idle;
            return Vec::new();
        }

        self.geocode_status = GeocodeStatus::Searching;
        vec![Action::Geocode {
            generation: self.geocode_generation,
            query: PlaceQuery::new(&self.place_name, &self.region),
        }]
    }

    pub fn on_candidates(&mut self, generation: u64, result: Result<Vec<PlaceCandidate>, AppError>) {
        if generation != self.geocode_generation {
            debug!(
                "Dropping stale geocoding response (generation {} < {})",
                generation, self.geocode_generation
            );
            return;
        }

        match result {
            Ok(candidates) => {
                debug!("Geocoder returned {} candidates", candidates.len());
                self.geocode_status = if candidates.is_empty() {
                    GeocodeStatus::NoMatches
                } else {
                    GeocodeStatus::Idle
                };
                self.candidates = candidates;
                self.highlighted = 0;
            }
            Err(e) => {
                warn!("Place lookup failed: {}", e);
                self.geocode_status = GeocodeStatus::Failed;
                self.candidates.clear();
            }
        }
    }

    pub fn select_highlighted(&mut self) -> Vec<Action> {
        match self.candidates.get(self.highlighted).cloned() {
            Some(candidate) => self.select_candidate(candidate),
            None => Vec::new(),
        }
    }

    /// Fills the form from `candidate` and looks up its air quality.
    /// Candidates without coordinates are ignored.
    pub fn select_candidate(&mut self, candidate: PlaceCandidate) -> Vec<Action> {
        let Some(coords) = candidate.coords else {
            debug!("Ignoring candidate {:?} without coordinates", candidate.name);
            return Vec::new();
        };

        self.latitude = coords.lat_param();
        self.longitude = coords.lon_param();
        self.place_name = candidate.name;
        self.region = candidate.region.unwrap_or_default();
        self.dismiss_candidates();

        self.fetch_air_quality(coords)
    }

    fn dismiss_candidates(&mut self) {
        // Bumping the generation keeps an in-flight search from reopening the list.
        self.geocode_generation += 1;
        self.candidates.clear();
        self.highlighted = 0;
        self.geocode_status = GeocodeStatus::Idle;
    }

    pub fn on_located(&mut self, result: Result<CoordinatePair, AppError>) -> Vec<Action> {
        self.locating = false;
        match result {
            Ok(coords) => {
                self.latitude = coords.lat_param();
                self.longitude = coords.lon_param();
                self.fetch_air_quality(coords)
            }
            Err(e) => {
                info!("Device location unavailable: {}", e);
                self.error = e.user_message().to_string();
                Vec::new()
            }
        }
    }

    fn fetch_air_quality(&mut self, coords: CoordinatePair) -> Vec<Action> {
        self.air_generation += 1;
        self.fetching = true;
        vec![Action::FetchAirQuality {
            generation: self.air_generation,
            coords,
        }]
    }

    pub fn on_air_quality(&mut self, generation: u64, result: Result<AirQualityReading, AppError>) {
        if generation != self.air_generation {
            debug!(
                "Dropping stale air-quality response (generation {} < {})",
                generation, self.air_generation
            );
            return;
        }
        self.fetching = false;

        match result {
            Ok(reading) => {
                info!("AQI {} received", reading.aqi);
                self.error.clear();
                self.reading = Some(reading);
                self.panel_visible = true;
            }
            Err(e) => {
                error!("Air quality lookup failed: {}", e);
                self.error = e.user_message().to_string();
                self.reading = None;
                self.panel_visible = false;
            }
        }
    }

    pub fn close_panel(&mut self) {
        self.panel_visible = false;
    }

    /// "2 (Fair)" for the reading on display.
    pub fn status_text(&self) -> Option<String> {
        self.reading.as_ref().map(|r| aqi::status_text(r.aqi))
    }

    pub fn aqi_level(&self) -> Option<AqiLevel> {
        self.reading.as_ref().map(|r| AqiLevel::from_index(r.aqi))
    }

    /// Untyped remainder of the first region suggestion that extends the
    /// region text, compared case-insensitively.
    pub fn region_completion(&self) -> Option<String> {
        if self.region.is_empty() {
            return None;
        }
        self.region_suggestions
            .iter()
            .filter_map(|s| completion_after(s, &self.region))
            .find(|rest| !rest.is_empty())
            .map(str::to_string)
    }

    fn accept_region_completion(&mut self) {
        if let Some(rest) = self.region_completion() {
            self.region.push_str(&rest);
        }
    }
}

/// Part of `suggestion` left after a case-insensitive match of `typed`.
/// Lowercase expansions are matched per suggestion char, so the split point
/// is always a char boundary of `suggestion`.
fn completion_after<'a>(suggestion: &'a str, typed: &str) -> Option<&'a str> {
    let typed: Vec<char> = typed.chars().flat_map(char::to_lowercase).collect();
    let mut matched = 0;
    let mut rest = suggestion.chars();
    while matched < typed.len() {
        let c = rest.next()?;
        for lc in c.to_lowercase() {
            if typed.get(matched) != Some(&lc) {
                return None;
            }
            matched += 1;
        }
    }
    Some(rest.as_str())
}
