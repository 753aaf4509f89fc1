use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::provider::{ContactInfo, ProviderKey, ProviderKind, ProviderRecord, SiteCoordinates};
use crate::ConfigError;

/// One hospital or clinic in the providers seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    pub kind: ProviderKind,
    pub address: String,
    #[serde(default)]
    pub contact: ContactInfo,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub insurances: Vec<String>,
}

impl ProviderEntry {
    #[must_use]
    pub fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name.clone(), self.kind)
    }

    /// The entry's position, or `None` if it is out of range.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude, self.longitude).ok()
    }

    /// Expand into data-source rows, one per accepted insurance.
    ///
    /// An entry with no insurances still yields one row so the provider exists.
    #[must_use]
    pub fn to_records(&self) -> Vec<ProviderRecord> {
        let location = SiteCoordinates::for_kind(
            self.kind,
            Some(self.latitude.into()),
            Some(self.longitude.into()),
        );
        let row = |insurance_name: Option<String>| ProviderRecord {
            name: self.name.clone(),
            kind: self.kind,
            address: self.address.clone(),
            contact: self.contact.clone(),
            location: location.clone(),
            insurance_name,
        };

        if self.insurances.is_empty() {
            return vec![row(None)];
        }
        self.insurances.iter().map(|i| row(Some(i.clone()))).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersFile {
    pub providers: Vec<ProviderEntry>,
}

impl ProvidersFile {
    /// All entries flattened into `(provider, insurance)` rows.
    #[must_use]
    pub fn to_records(&self) -> Vec<ProviderRecord> {
        self.providers
            .iter()
            .flat_map(ProviderEntry::to_records)
            .collect()
    }
}

/// Load and validate the providers seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_providers_file(path: &Path) -> Result<ProvidersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProvidersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_providers_file(&content)
}

fn parse_providers_file(content: &str) -> Result<ProvidersFile, ConfigError> {
    let file: ProvidersFile =
        serde_yaml::from_str(content).map_err(ConfigError::ProvidersFileParse)?;

    validate_providers(&file)?;

    Ok(file)
}

fn validate_providers(file: &ProvidersFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in &file.providers {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "provider name must be non-empty".to_string(),
            ));
        }

        if let Err(e) = Coordinate::new(entry.latitude, entry.longitude) {
            return Err(ConfigError::Validation(format!(
                "{} '{}' has an invalid position: {e}",
                entry.kind, entry.name
            )));
        }

        if entry.insurances.iter().any(|i| i.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} '{}' lists a blank insurance name",
                entry.kind, entry.name
            )));
        }

        if !seen.insert(entry.key()) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider: {}",
                entry.key()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Site;

    const SAMPLE: &str = r"
providers:
  - name: St. Luke's Medical Center
    kind: hospital
    address: 279 E Rodriguez Sr. Ave, Quezon City
    contact:
      phone: '+63 2 8723 0101'
      website: https://www.stlukes.com.ph
    latitude: 14.6226
    longitude: 121.0233
    insurances: [Maxicare, PhilHealth]
  - name: St. Luke's Medical Center
    kind: clinic
    address: 32nd St, Taguig
    latitude: 14.5547
    longitude: 121.0509
  - name: HealthFirst Clinic
    kind: clinic
    address: Ayala Ave, Makati
    contact:
      email: hello@healthfirst.example
    latitude: 14.5547
    longitude: 121.0244
    insurances: [Intellicare]
";

    fn entry(name: &str, kind: ProviderKind) -> ProviderEntry {
        ProviderEntry {
            name: name.to_string(),
            kind,
            address: "somewhere".to_string(),
            contact: ContactInfo::default(),
            latitude: 14.6,
            longitude: 121.0,
            insurances: vec!["Maxicare".to_string()],
        }
    }

    #[test]
    fn parses_sample_file() {
        let file = parse_providers_file(SAMPLE).unwrap();
        assert_eq!(file.providers.len(), 3);
        assert_eq!(file.providers[0].kind, ProviderKind::Hospital);
        assert_eq!(
            file.providers[0].contact.phone.as_deref(),
            Some("+63 2 8723 0101")
        );
        assert!(file.providers[1].insurances.is_empty());
    }

    #[test]
    fn same_name_different_kind_is_allowed() {
        let file = ProvidersFile {
            providers: vec![
                entry("Asian Hospital", ProviderKind::Hospital),
                entry("Asian Hospital", ProviderKind::Clinic),
            ],
        };
        assert!(validate_providers(&file).is_ok());
    }

    #[test]
    fn rejects_duplicate_provider() {
        let file = ProvidersFile {
            providers: vec![
                entry("Asian Hospital", ProviderKind::Hospital),
                entry("Asian Hospital", ProviderKind::Hospital),
            ],
        };
        let err = validate_providers(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate provider"));
    }

    #[test]
    fn rejects_empty_name() {
        let file = ProvidersFile {
            providers: vec![entry("  ", ProviderKind::Clinic)],
        };
        let err = validate_providers(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn rejects_out_of_range_position() {
        let mut bad = entry("Far Away", ProviderKind::Clinic);
        bad.latitude = 123.0;
        let file = ProvidersFile {
            providers: vec![bad],
        };
        let err = validate_providers(&file).unwrap_err();
        assert!(err.to_string().contains("invalid position"));
    }

    #[test]
    fn rejects_blank_insurance() {
        let mut bad = entry("Blank", ProviderKind::Clinic);
        bad.insurances.push("   ".to_string());
        let file = ProvidersFile {
            providers: vec![bad],
        };
        assert!(validate_providers(&file).is_err());
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let yaml = "providers:\n  - name: X\n    kind: pharmacy\n    address: a\n    latitude: 0\n    longitude: 0\n";
        assert!(matches!(
            parse_providers_file(yaml),
            Err(ConfigError::ProvidersFileParse(_))
        ));
    }

    #[test]
    fn expands_one_row_per_insurance() {
        let file = parse_providers_file(SAMPLE).unwrap();
        let rows = file.to_records();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].insurance_name.as_deref(), Some("Maxicare"));
        assert_eq!(rows[1].insurance_name.as_deref(), Some("PhilHealth"));
        assert_eq!(rows[2].insurance_name, None);
    }

    #[test]
    fn rows_carry_kind_specific_coordinates() {
        let file = parse_providers_file(SAMPLE).unwrap();
        let rows = file.to_records();
        assert!(rows[0].location.hospital_latitude.is_some());
        assert!(rows[2].location.clinic_latitude.is_some());
        let coord = rows[3].coordinate().unwrap();
        assert!((coord.latitude() - 14.5547).abs() < 1e-9);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_providers_file(Path::new("/nonexistent/providers.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ProvidersFileIo { ref path, .. } if path.contains("providers.yaml")));
    }

    #[test]
    fn load_providers_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("providers.yaml");
        let file = load_providers_file(&path).unwrap();
        assert!(!file.providers.is_empty());
        assert!(file.providers.iter().all(|p| p.coordinate().is_some()));
    }
}
