use clinnect_core::ProviderRecord;
use sqlx::PgPool;

use super::types::ProviderInsuranceRow;
use crate::DbError;

/// Escape LIKE metacharacters and wrap in `%` for a "contains" match.
pub(crate) fn contains_pattern(substr: &str) -> String {
    let mut pattern = String::with_capacity(substr.len() + 2);
    pattern.push('%');
    for c in substr.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Every `(provider, insurance)` pair whose insurance name contains `substr`,
/// case-insensitively, across hospitals and clinics.
///
/// Ordered by kind, provider name, then insurance name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidKind`]
/// if a row cannot be converted.
pub async fn find_providers_by_insurance(
    pool: &PgPool,
    substr: &str,
) -> Result<Vec<ProviderRecord>, DbError> {
    let rows = sqlx::query_as::<_, ProviderInsuranceRow>(
        "SELECT h.name, 'hospital' AS kind, h.address, h.email, h.contact AS phone, h.website, \
                h.latitude::TEXT AS hospital_latitude, h.longitude::TEXT AS hospital_longitude, \
                NULL::TEXT AS clinic_latitude, NULL::TEXT AS clinic_longitude, \
                i.name AS insurance_name \
         FROM hospitals h \
         JOIN hospital_insurances hi ON hi.hospital_id = h.id \
         JOIN insurances i ON i.id = hi.insurance_id \
         WHERE i.name ILIKE $1 ESCAPE '\\' \
         UNION ALL \
         SELECT c.name, 'clinic' AS kind, c.address, c.email, c.contact AS phone, c.website, \
                NULL::TEXT, NULL::TEXT, \
                c.latitude::TEXT, c.longitude::TEXT, \
                i.name \
         FROM clinics c \
         JOIN clinic_insurances ci ON ci.clinic_id = c.id \
         JOIN insurances i ON i.id = ci.insurance_id \
         WHERE i.name ILIKE $1 ESCAPE '\\' \
         ORDER BY kind, name, insurance_name",
    )
    .bind(contains_pattern(substr))
    .fetch_all(pool)
    .await?;

    tracing::debug!(query = substr, rows = rows.len(), "provider lookup");

    rows.into_iter()
        .map(ProviderInsuranceRow::into_record)
        .collect()
}
