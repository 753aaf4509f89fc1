use clinnect_core::{ProviderKind, ProvidersFile};
use sqlx::PgPool;

use crate::DbError;

/// Counts from one [`seed_providers`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub hospitals: usize,
    pub clinics: usize,
    /// Provider/insurance links written (existing links included).
    pub links: usize,
}

/// Upsert hospitals, clinics, insurances and their links from the seed file.
///
/// All upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back. Providers are keyed by name within their
/// table, insurances by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_providers(pool: &PgPool, file: &ProvidersFile) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for entry in &file.providers {
        let (upsert_provider, link_insurance) = match entry.kind {
            ProviderKind::Hospital => (
                "INSERT INTO hospitals (name, address, email, contact, website, latitude, longitude) \
                 VALUES ($1, $2, $3, $4, $5, $6::NUMERIC, $7::NUMERIC) \
                 ON CONFLICT (name) DO UPDATE SET \
                     address = EXCLUDED.address, \
                     email = EXCLUDED.email, \
                     contact = EXCLUDED.contact, \
                     website = EXCLUDED.website, \
                     latitude = EXCLUDED.latitude, \
                     longitude = EXCLUDED.longitude, \
                     updated_at = NOW() \
                 RETURNING id",
                "INSERT INTO hospital_insurances (hospital_id, insurance_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            ),
            ProviderKind::Clinic => (
                "INSERT INTO clinics (name, address, email, contact, website, latitude, longitude) \
                 VALUES ($1, $2, $3, $4, $5, $6::NUMERIC, $7::NUMERIC) \
                 ON CONFLICT (name) DO UPDATE SET \
                     address = EXCLUDED.address, \
                     email = EXCLUDED.email, \
                     contact = EXCLUDED.contact, \
                     website = EXCLUDED.website, \
                     latitude = EXCLUDED.latitude, \
                     longitude = EXCLUDED.longitude, \
                     updated_at = NOW() \
                 RETURNING id",
                "INSERT INTO clinic_insurances (clinic_id, insurance_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            ),
        };

        let provider_id: i64 = sqlx::query_scalar(upsert_provider)
            .bind(&entry.name)
            .bind(&entry.address)
            .bind(&entry.contact.email)
            .bind(&entry.contact.phone)
            .bind(&entry.contact.website)
            .bind(entry.latitude)
            .bind(entry.longitude)
            .fetch_one(&mut *tx)
            .await?;

        for insurance in &entry.insurances {
            let insurance_id: i64 = sqlx::query_scalar(
                "INSERT INTO insurances (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                 RETURNING id",
            )
            .bind(insurance.trim())
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(link_insurance)
                .bind(provider_id)
                .bind(insurance_id)
                .execute(&mut *tx)
                .await?;
            summary.links += 1;
        }

        match entry.kind {
            ProviderKind::Hospital => summary.hospitals += 1,
            ProviderKind::Clinic => summary.clinics += 1,
        }
    }

    tx.commit().await?;
    tracing::info!(
        hospitals = summary.hospitals,
        clinics = summary.clinics,
        links = summary.links,
        "providers seeded"
    );
    Ok(summary)
}
