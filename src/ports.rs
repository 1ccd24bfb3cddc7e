use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;

use crate::models::{PortEntry, PortsResponse};

pub const DEFAULT_PORT: &str = "Callao";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Port {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Port {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Error)]
pub enum PortRegistryError {
    #[error("default port `{0}` is not in the registry")]
    MissingDefault(String),
    #[error("port `{0}` is listed more than once")]
    Duplicate(String),
    #[error("port `{name}` has coordinates outside WGS84 range ({latitude}, {longitude})")]
    InvalidCoordinates {
        name: String,
        latitude: f64,
        longitude: f64,
    },
    #[error("failed to read port registry CSV")]
    Csv(#[from] csv::Error),
}

/// Named reference ports used as the origin for distance penalties.
///
/// Unknown names resolve to the registry's default port rather than failing,
/// so a stale port selector on the client still gets a ranking.
#[derive(Debug, Clone)]
pub struct PortRegistry {
    ports: HashMap<String, Port>,
    default: String,
}

impl PortRegistry {
    pub fn new(ports: Vec<Port>, default: impl Into<String>) -> Result<Self, PortRegistryError> {
        let default = default.into();
        let mut by_name = HashMap::with_capacity(ports.len());

        for port in ports {
            let in_range = (-90.0..=90.0).contains(&port.latitude)
                && (-180.0..=180.0).contains(&port.longitude);
            if !in_range {
                return Err(PortRegistryError::InvalidCoordinates {
                    name: port.name,
                    latitude: port.latitude,
                    longitude: port.longitude,
                });
            }
            if by_name.contains_key(&port.name) {
                return Err(PortRegistryError::Duplicate(port.name));
            }
            by_name.insert(port.name.clone(), port);
        }

        if !by_name.contains_key(&default) {
            return Err(PortRegistryError::MissingDefault(default));
        }

        Ok(Self {
            ports: by_name,
            default,
        })
    }

    /// Load ports from CSV with a `name,latitude,longitude` header.
    pub fn from_csv<R: Read>(reader: R, default: impl Into<String>) -> Result<Self, PortRegistryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let ports = csv_reader
            .deserialize::<Port>()
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(ports, default)
    }

    /// Artisanal fleet ports along the Peruvian coast.
    pub fn peru() -> Self {
        let ports = vec![
            Port::new("Paita", -5.09, -81.11),
            Port::new("Chimbote", -9.07, -78.59),
            Port::new("Callao", -12.06, -77.15),
            Port::new("Pisco", -13.71, -76.22),
            Port::new("Matarani", -17.0, -72.1),
            Port::new("Ilo", -17.65, -71.34),
        ];
        let ports = ports.into_iter().map(|p| (p.name.clone(), p)).collect();

        Self {
            ports,
            default: DEFAULT_PORT.to_string(),
        }
    }

    /// Same ports, different fallback.
    pub fn with_default(self, default: impl Into<String>) -> Result<Self, PortRegistryError> {
        let default = default.into();
        if !self.ports.contains_key(&default) {
            return Err(PortRegistryError::MissingDefault(default));
        }
        Ok(Self { default, ..self })
    }

    pub fn get(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }

    pub fn default_port(&self) -> &Port {
        // Constructors guarantee the default is present.
        &self.ports[&self.default]
    }

    pub fn resolve(&self, name: &str) -> &Port {
        self.get(name).unwrap_or_else(|| self.default_port())
    }

    pub fn to_response(&self) -> PortsResponse {
        let mut ports: Vec<PortEntry> = self
            .ports
            .values()
            .map(|p| PortEntry {
                name: p.name.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
            })
            .collect();
        // North to south, the way the coast reads on the map.
        ports.sort_by(|a, b| b.latitude.total_cmp(&a.latitude).then_with(|| a.name.cmp(&b.name)));

        PortsResponse {
            default: self.default.clone(),
            ports,
        }
    }
}
