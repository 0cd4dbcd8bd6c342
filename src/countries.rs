use csv::ReaderBuilder;
use std::collections::HashMap;
use tracing::{error, warn};

const COUNTRIES_CSV: &str = include_str!("../data/countries.csv");

/// ISO 3166-1 alpha-2 code to display name lookup.
#[derive(Debug, Clone, Default)]
pub struct CountryDirectory {
    names: HashMap<String, String>,
}

impl CountryDirectory {
    /// Loads the table bundled with the binary.
    pub fn embedded() -> Self {
        Self::from_csv(COUNTRIES_CSV)
    }

    /// Reads a `code,name` table. Bad rows are skipped; a table without a
    /// `code` column yields an empty directory, which still renders raw codes.
    pub fn from_csv(data: &str) -> Self {
        let mut names = HashMap::new();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());

        let headers = match rdr.headers() {
            Ok(h) => h.clone(),
            Err(e) => {
                error!("Failed to read country table headers: {}", e);
                return Self { names };
            }
        };

        let find_col = |name: &str| {
            headers.iter().position(|h| {
                h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name)
            })
        };

        let (code_idx, name_idx) = match (find_col("code"), find_col("name")) {
            (Some(c), Some(n)) => (c, n),
            _ => {
                error!("Country table missing 'code'/'name' columns. Headers found: {:?}", headers);
                return Self { names };
            }
        };

        for result in rdr.records() {
            match result {
                Ok(record) => {
                    let code = record.get(code_idx).unwrap_or("").trim().to_uppercase();
                    let name = record.get(name_idx).unwrap_or("").trim();
                    if !code.is_empty() && !name.is_empty() {
                        names.insert(code, name.to_string());
                    }
                }
                Err(e) => warn!("Skipping bad country row: {}", e),
            }
        }

        Self { names }
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names
            .get(&code.trim().to_uppercase())
            .map(String::as_str)
    }

    /// Display name for `code`, or the code itself when it is not in the table.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.name(code).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
