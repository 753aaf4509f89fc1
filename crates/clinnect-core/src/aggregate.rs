//! Collapse `(provider, insurance)` rows into one record per provider.

use std::collections::HashMap;

use crate::provider::{AggregatedProvider, ProviderKey, ProviderRecord, Site};

/// A later row disagreed with the first row seen for the same provider key.
///
/// The first-seen values are kept; this records what was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingProviderData {
    pub key: ProviderKey,
    /// Names of the fields that differed (`address`, `contact`, `location`).
    pub fields: Vec<&'static str>,
    /// Zero-based index of the disagreeing row in the input.
    pub row_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub providers: Vec<AggregatedProvider>,
    pub conflicts: Vec<ConflictingProviderData>,
}

/// Group rows by `(name, kind)` and merge their insurance names.
///
/// Output follows first-occurrence order. Conflicting duplicates are logged at
/// warn level; use [`aggregate_with_diagnostics`] to inspect them.
#[must_use]
pub fn aggregate(rows: &[ProviderRecord]) -> Vec<AggregatedProvider> {
    let Aggregation {
        providers,
        conflicts,
    } = aggregate_with_diagnostics(rows);

    for conflict in &conflicts {
        tracing::warn!(
            provider = %conflict.key,
            fields = ?conflict.fields,
            row = conflict.row_index,
            "conflicting provider data; keeping first-seen values"
        );
    }

    providers
}

/// Same grouping as [`aggregate`], returning conflicts instead of logging them.
#[must_use]
pub fn aggregate_with_diagnostics(rows: &[ProviderRecord]) -> Aggregation {
    let mut index_by_key: HashMap<ProviderKey, usize> = HashMap::new();
    let mut out = Aggregation::default();

    for (row_index, row) in rows.iter().enumerate() {
        let key = row.key();
        let slot = match index_by_key.get(&key) {
            Some(&slot) => {
                if let Some(existing) = out.providers.get(slot) {
                    let fields = differing_fields(existing, row);
                    if !fields.is_empty() {
                        out.conflicts.push(ConflictingProviderData {
                            key: key.clone(),
                            fields,
                            row_index,
                        });
                    }
                }
                slot
            }
            None => {
                out.providers.push(AggregatedProvider::seed(row));
                let slot = out.providers.len() - 1;
                index_by_key.insert(key, slot);
                slot
            }
        };

        let insurance = row
            .insurance_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let (Some(name), Some(provider)) = (insurance, out.providers.get_mut(slot)) {
            provider.insurances.insert(name.to_string());
        }
    }

    out
}

fn differing_fields(existing: &AggregatedProvider, row: &ProviderRecord) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if existing.address != row.address {
        fields.push("address");
    }
    if existing.contact != row.contact {
        fields.push("contact");
    }
    if existing.location != row.location {
        fields.push("location");
    }
    fields
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::geo::Coordinate;
    use crate::provider::{ContactInfo, ProviderKind, SiteCoordinates};

    fn row(name: &str, kind: ProviderKind, insurance: Option<&str>) -> ProviderRecord {
        ProviderRecord {
            name: name.to_string(),
            kind,
            address: format!("{name} street"),
            contact: ContactInfo::default(),
            location: SiteCoordinates::generic(Coordinate::new(14.6, 121.0).unwrap()),
            insurance_name: insurance.map(str::to_string),
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn groups_by_name_and_kind() {
        let rows = vec![
            row("Hosp A", ProviderKind::Hospital, Some("X")),
            row("Hosp A", ProviderKind::Hospital, Some("Y")),
            row("Hosp B", ProviderKind::Clinic, Some("X")),
        ];
        let out = aggregate(&rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Hosp A");
        assert_eq!(out[0].insurances, set(&["X", "Y"]));
        assert_eq!(out[1].name, "Hosp B");
        assert_eq!(out[1].kind, ProviderKind::Clinic);
        assert_eq!(out[1].insurances, set(&["X"]));
    }

    #[test]
    fn same_name_different_kind_stays_separate() {
        let rows = vec![
            row("Asian Hospital", ProviderKind::Hospital, Some("X")),
            row("Asian Hospital", ProviderKind::Clinic, Some("X")),
        ];
        assert_eq!(aggregate(&rows).len(), 2);
    }

    #[test]
    fn key_is_case_sensitive() {
        let rows = vec![
            row("medical city", ProviderKind::Hospital, None),
            row("Medical City", ProviderKind::Hospital, None),
        ];
        assert_eq!(aggregate(&rows).len(), 2);
    }

    #[test]
    fn duplicate_insurances_are_absorbed() {
        let rows = vec![
            row("Hosp A", ProviderKind::Hospital, Some("Maxicare")),
            row("Hosp A", ProviderKind::Hospital, Some("Maxicare")),
            row("Hosp A", ProviderKind::Hospital, Some(" Maxicare ")),
        ];
        let out = aggregate(&rows);
        assert_eq!(out[0].insurances, set(&["Maxicare"]));
    }

    #[test]
    fn blank_insurance_still_seeds_provider() {
        let rows = vec![
            row("Clinic Z", ProviderKind::Clinic, None),
            row("Clinic Z", ProviderKind::Clinic, Some("   ")),
        ];
        let out = aggregate(&rows);
        assert_eq!(out.len(), 1);
        assert!(out[0].insurances.is_empty());
    }

    #[test]
    fn output_follows_first_occurrence_order() {
        let rows = vec![
            row("C", ProviderKind::Clinic, Some("1")),
            row("A", ProviderKind::Hospital, Some("1")),
            row("C", ProviderKind::Clinic, Some("2")),
            row("B", ProviderKind::Hospital, Some("1")),
        ];
        let names: Vec<_> = aggregate(&rows).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let rows = vec![
            row("Hosp A", ProviderKind::Hospital, Some("Y")),
            row("Hosp B", ProviderKind::Clinic, Some("X")),
            row("Hosp A", ProviderKind::Hospital, Some("X")),
        ];
        assert_eq!(aggregate(&rows), aggregate(&rows));
    }

    #[test]
    fn conflicting_rows_keep_first_seen_and_report() {
        let first = row("Hosp A", ProviderKind::Hospital, Some("X"));
        let mut second = row("Hosp A", ProviderKind::Hospital, Some("Y"));
        second.address = "somewhere else".to_string();
        second.contact.phone = Some("555-0100".to_string());

        let result = aggregate_with_diagnostics(&[first, second]);
        assert_eq!(result.providers.len(), 1);
        assert_eq!(result.providers[0].address, "Hosp A street");
        assert_eq!(result.providers[0].insurances, set(&["X", "Y"]));

        assert_eq!(result.conflicts.len(), 1);
        let conflict = &result.conflicts[0];
        assert_eq!(conflict.row_index, 1);
        assert_eq!(conflict.fields, vec!["address", "contact"]);
    }

    #[test]
    fn agreeing_duplicates_report_no_conflict() {
        let rows = vec![
            row("Hosp A", ProviderKind::Hospital, Some("X")),
            row("Hosp A", ProviderKind::Hospital, Some("Y")),
        ];
        assert!(aggregate_with_diagnostics(&rows).conflicts.is_empty());
    }
}
