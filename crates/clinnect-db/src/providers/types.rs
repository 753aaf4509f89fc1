//! Row types for the provider/insurance join.

use clinnect_core::{
    CoordinateValue, ContactInfo, ProviderKind, ProviderRecord, SiteCoordinates,
};

use crate::DbError;

/// One `(provider, insurance)` pairing as selected by
/// [`find_providers_by_insurance`](super::find_providers_by_insurance).
///
/// Coordinates are NUMERIC in the schema and selected as text; hospitals fill
/// the `hospital_*` pair, clinics the `clinic_*` pair.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderInsuranceRow {
    pub name: String,
    pub kind: String,
    pub address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hospital_latitude: Option<String>,
    pub hospital_longitude: Option<String>,
    pub clinic_latitude: Option<String>,
    pub clinic_longitude: Option<String>,
    pub insurance_name: String,
}

impl ProviderInsuranceRow {
    /// Convert into the core row shape.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidKind`] if `kind` is neither `hospital` nor `clinic`.
    pub fn into_record(self) -> Result<ProviderRecord, DbError> {
        let kind: ProviderKind = self.kind.parse().map_err(|_| DbError::InvalidKind {
            name: self.name.clone(),
            kind: self.kind.clone(),
        })?;

        let text = |v: Option<String>| v.map(CoordinateValue::Text);
        let location = SiteCoordinates {
            hospital_latitude: text(self.hospital_latitude),
            hospital_longitude: text(self.hospital_longitude),
            clinic_latitude: text(self.clinic_latitude),
            clinic_longitude: text(self.clinic_longitude),
            ..SiteCoordinates::default()
        };

        Ok(ProviderRecord {
            name: self.name,
            kind,
            address: self.address,
            contact: ContactInfo {
                email: self.email,
                phone: self.phone,
                website: self.website,
            },
            location,
            insurance_name: Some(self.insurance_name),
        })
    }
}
