//! Provider records as delivered by the data source, and their aggregated form.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Hospital,
    Clinic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Hospital => write!(f, "hospital"),
            ProviderKind::Clinic => write!(f, "clinic"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hospital" => Ok(ProviderKind::Hospital),
            "clinic" => Ok(ProviderKind::Clinic),
            other => Err(format!("unknown provider kind '{other}'")),
        }
    }
}

/// Grouping key for aggregation: exact, case-sensitive `(name, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    pub name: String,
    pub kind: ProviderKind,
}

impl ProviderKey {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    /// Contact number. Serialized as `contact`, the name map clients and the
    /// database use; `phone` is accepted on input.
    #[serde(default, rename = "contact", alias = "phone")]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// A single coordinate component as the data source hands it over.
///
/// DECIMAL columns frequently arrive as text, so both shapes are accepted and
/// parsing is deferred until a coordinate is actually needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    /// The component as a finite number, if it parses to one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CoordinateValue::Number(n) => *n,
            CoordinateValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        CoordinateValue::Number(value)
    }
}

impl From<&str> for CoordinateValue {
    fn from(value: &str) -> Self {
        CoordinateValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed coordinate for {kind} '{name}': {reason}")]
pub struct MalformedCoordinate {
    pub name: String,
    pub kind: ProviderKind,
    pub reason: String,
}

/// Every coordinate field a provider row may carry.
///
/// Hospitals and clinics come out of differently shaped tables, so a row can
/// hold a kind-specific pair, the generic pair, or both. [`Site::coordinate`]
/// is the only place that decides which pair wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteCoordinates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<CoordinateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<CoordinateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_latitude: Option<CoordinateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_longitude: Option<CoordinateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_latitude: Option<CoordinateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_longitude: Option<CoordinateValue>,
}

impl SiteCoordinates {
    /// Coordinates stored only under the generic `latitude`/`longitude` keys.
    #[must_use]
    pub fn generic(coordinate: Coordinate) -> Self {
        Self {
            latitude: Some(coordinate.latitude().into()),
            longitude: Some(coordinate.longitude().into()),
            ..Self::default()
        }
    }

    /// Coordinates stored under the kind-specific keys for `kind`.
    #[must_use]
    pub fn for_kind(
        kind: ProviderKind,
        latitude: Option<CoordinateValue>,
        longitude: Option<CoordinateValue>,
    ) -> Self {
        match kind {
            ProviderKind::Hospital => Self {
                hospital_latitude: latitude,
                hospital_longitude: longitude,
                ..Self::default()
            },
            ProviderKind::Clinic => Self {
                clinic_latitude: latitude,
                clinic_longitude: longitude,
                ..Self::default()
            },
        }
    }

    fn pair_for(
        &self,
        kind: ProviderKind,
    ) -> (Option<&CoordinateValue>, Option<&CoordinateValue>) {
        let specific = match kind {
            ProviderKind::Hospital => (
                self.hospital_latitude.as_ref(),
                self.hospital_longitude.as_ref(),
            ),
            ProviderKind::Clinic => (self.clinic_latitude.as_ref(), self.clinic_longitude.as_ref()),
        };
        if specific.0.is_some() || specific.1.is_some() {
            specific
        } else {
            (self.latitude.as_ref(), self.longitude.as_ref())
        }
    }

    fn resolve(&self, name: &str, kind: ProviderKind) -> Result<Coordinate, MalformedCoordinate> {
        let malformed = |reason: String| MalformedCoordinate {
            name: name.to_string(),
            kind,
            reason,
        };

        let (lat, lon) = self.pair_for(kind);
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(malformed("latitude or longitude missing".to_string()));
        };
        let latitude = lat
            .as_f64()
            .ok_or_else(|| malformed(format!("latitude {lat:?} is not a finite number")))?;
        let longitude = lon
            .as_f64()
            .ok_or_else(|| malformed(format!("longitude {lon:?} is not a finite number")))?;

        Coordinate::new(latitude, longitude).map_err(|e| malformed(e.to_string()))
    }
}

/// Shared accessors for anything that describes a provider site.
pub trait Site {
    fn name(&self) -> &str;
    fn kind(&self) -> ProviderKind;
    fn contact_info(&self) -> &ContactInfo;
    fn site_coordinates(&self) -> &SiteCoordinates;

    /// Resolve the comparison coordinate, preferring the kind-specific pair.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedCoordinate`] if the selected pair is missing or does
    /// not parse to a valid coordinate.
    fn coordinate(&self) -> Result<Coordinate, MalformedCoordinate> {
        self.site_coordinates().resolve(self.name(), self.kind())
    }

    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name(), self.kind())
    }
}

/// One `(provider, insurance)` row from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub address: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(flatten)]
    pub location: SiteCoordinates,
    #[serde(default)]
    pub insurance_name: Option<String>,
}

impl Site for ProviderRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn contact_info(&self) -> &ContactInfo {
        &self.contact
    }

    fn site_coordinates(&self) -> &SiteCoordinates {
        &self.location
    }
}

/// One provider with every insurance it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedProvider {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub address: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(flatten)]
    pub location: SiteCoordinates,
    pub insurances: BTreeSet<String>,
}

impl AggregatedProvider {
    /// Seed an aggregate from a row's non-insurance fields.
    #[must_use]
    pub fn seed(record: &ProviderRecord) -> Self {
        Self {
            name: record.name.clone(),
            kind: record.kind,
            address: record.address.clone(),
            contact: record.contact.clone(),
            location: record.location.clone(),
            insurances: BTreeSet::new(),
        }
    }
}

impl Site for AggregatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn contact_info(&self) -> &ContactInfo {
        &self.contact
    }

    fn site_coordinates(&self) -> &SiteCoordinates {
        &self.location
    }
}
