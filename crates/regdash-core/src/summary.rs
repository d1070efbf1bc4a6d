//! Aggregation of registration records for tables and charts.
//!
//! Everything here is pure: the same input always yields the same output,
//! so the dashboard can recompute on every refresh without bookkeeping.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::models::Record;

/// Fixed age bands used by the age distribution.
///
/// Bands are half-open `[lower, upper)`. Labels are the display labels the
/// registration team uses, which name whole-year ranges rather than the
/// bounds (`[18, 21)` shows as "19-21").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeBand {
    #[serde(rename = "15-18")]
    From15To18,
    #[serde(rename = "19-21")]
    From19To21,
    #[serde(rename = "22-24")]
    From22To24,
    #[serde(rename = "25-27")]
    From25To27,
    #[serde(rename = "28-30")]
    From28To30,
    #[serde(rename = "30-above")]
    Above30,
}

impl AgeBand {
    /// All bands in display order
    pub const ALL: [AgeBand; 6] = [
        AgeBand::From15To18,
        AgeBand::From19To21,
        AgeBand::From22To24,
        AgeBand::From25To27,
        AgeBand::From28To30,
        AgeBand::Above30,
    ];

    /// Band containing `age`. Ages below 15 (and NaN) belong to no band.
    pub fn from_age(age: f64) -> Option<Self> {
        if age.is_nan() || age < 15.0 {
            None
        } else if age < 18.0 {
            Some(AgeBand::From15To18)
        } else if age < 21.0 {
            Some(AgeBand::From19To21)
        } else if age < 24.0 {
            Some(AgeBand::From22To24)
        } else if age < 27.0 {
            Some(AgeBand::From25To27)
        } else if age < 30.0 {
            Some(AgeBand::From28To30)
        } else {
            Some(AgeBand::Above30)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::From15To18 => "15-18",
            AgeBand::From19To21 => "19-21",
            AgeBand::From22To24 => "22-24",
            AgeBand::From25To27 => "25-27",
            AgeBand::From28To30 => "28-30",
            AgeBand::Above30 => "30-above",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trim and title-case free-text gender. Blank input is missing.
///
/// Title-casing uppercases the first letter of every alphabetic run and
/// lowercases the rest, so " non-BINARY " becomes "Non-Binary".
pub fn normalize_gender(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(trimmed.len());
    let mut at_word_start = true;
    for c in trimmed.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                normalized.extend(c.to_uppercase());
            } else {
                normalized.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            normalized.push(c);
            at_word_start = true;
        }
    }
    Some(normalized)
}

/// A group label and its tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal<V> {
    pub label: String,
    pub value: V,
}

/// Order groups by value descending, then label ascending
fn sort_groups<V: PartialOrd>(groups: &mut [GroupTotal<V>]) {
    groups.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
}

/// Count items per key. Items whose key is `None` are left out.
pub fn group_count<T, F>(items: &[T], key: F) -> Vec<GroupTotal<usize>>
where
    F: Fn(&T) -> Option<String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        if let Some(k) = key(item) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }

    let mut groups: Vec<GroupTotal<usize>> = counts
        .into_iter()
        .map(|(label, value)| GroupTotal { label, value })
        .collect();
    sort_groups(&mut groups);
    groups
}

/// Sum `value` per key. Items with a missing key or value are left out.
pub fn group_sum<T, K, V>(items: &[T], key: K, value: V) -> Vec<GroupTotal<f64>>
where
    K: Fn(&T) -> Option<String>,
    V: Fn(&T) -> Option<f64>,
{
    let mut sums: HashMap<String, f64> = HashMap::new();
    for item in items {
        if let (Some(k), Some(v)) = (key(item), value(item)) {
            *sums.entry(k).or_insert(0.0) += v;
        }
    }

    let mut groups: Vec<GroupTotal<f64>> = sums
        .into_iter()
        .map(|(label, value)| GroupTotal { label, value })
        .collect();
    sort_groups(&mut groups);
    groups
}

/// Registrants per age band, every band present (zero-filled) in band order.
/// Records without a valid age, or younger than the lowest band, are skipped.
pub fn age_distribution(records: &[Record]) -> Vec<(AgeBand, usize)> {
    let mut counts = [0usize; AgeBand::ALL.len()];
    for band in records
        .iter()
        .filter_map(Record::age_years)
        .filter_map(AgeBand::from_age)
    {
        counts[band as usize] += 1;
    }
    AgeBand::ALL.iter().copied().zip(counts).collect()
}

/// Registrants per normalized gender
pub fn gender_breakdown(records: &[Record]) -> Vec<GroupTotal<usize>> {
    group_count(records, |r| r.gender.as_deref().and_then(normalize_gender))
}

/// Registrants per affiliation
pub fn affiliation_breakdown(records: &[Record]) -> Vec<GroupTotal<usize>> {
    group_count(records, |r| r.affiliation_name().map(str::to_string))
}

/// Everything the dashboard shows, computed in one pass over the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_registrants: usize,
    /// Records whose age parsed as a number
    pub with_valid_age: usize,
    pub average_age: Option<f64>,
    pub distinct_affiliations: usize,
    pub age_groups: Vec<(AgeBand, usize)>,
    pub genders: Vec<GroupTotal<usize>>,
    pub affiliations: Vec<GroupTotal<usize>>,
}

impl Summary {
    pub fn from_records(records: &[Record]) -> Self {
        let ages: Vec<f64> = records.iter().filter_map(Record::age_years).collect();
        let average_age = if ages.is_empty() {
            None
        } else {
            Some(ages.iter().sum::<f64>() / ages.len() as f64)
        };
        let affiliations = affiliation_breakdown(records);

        Self {
            total_registrants: records.len(),
            with_valid_age: ages.len(),
            average_age,
            distinct_affiliations: affiliations.len(),
            age_groups: age_distribution(records),
            genders: gender_breakdown(records),
            affiliations,
        }
    }

    /// Registrants counted in some age band
    pub fn banded_total(&self) -> usize {
        self.age_groups.iter().map(|(_, count)| count).sum()
    }

    /// The `n` largest affiliations
    pub fn top_affiliations(&self, n: usize) -> &[GroupTotal<usize>] {
        &self.affiliations[..n.min(self.affiliations.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.total_registrants == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn person(age: Value, gender: &str, affiliation: &str) -> Record {
        Record {
            age: Some(age),
            gender: Some(gender.to_string()),
            affiliation: Some(affiliation.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_age_band_boundaries() {
        assert_eq!(AgeBand::from_age(14.9), None);
        assert_eq!(AgeBand::from_age(15.0), Some(AgeBand::From15To18));
        assert_eq!(AgeBand::from_age(17.99), Some(AgeBand::From15To18));
        assert_eq!(AgeBand::from_age(18.0), Some(AgeBand::From19To21));
        assert_eq!(AgeBand::from_age(21.0), Some(AgeBand::From22To24));
        assert_eq!(AgeBand::from_age(24.0), Some(AgeBand::From25To27));
        assert_eq!(AgeBand::from_age(27.0), Some(AgeBand::From28To30));
        assert_eq!(AgeBand::from_age(30.0), Some(AgeBand::Above30));
        assert_eq!(AgeBand::from_age(85.0), Some(AgeBand::Above30));
        assert_eq!(AgeBand::from_age(f64::NAN), None);
    }

    #[test]
    fn test_age_distribution_example() {
        let records: Vec<Record> = [json!(17), json!(19), json!(25), json!(31), Value::Null]
            .into_iter()
            .map(|age| person(age, "F", "X"))
            .collect();

        let labelled: Vec<(&str, usize)> = age_distribution(&records)
            .into_iter()
            .map(|(band, count)| (band.label(), count))
            .collect();

        assert_eq!(
            labelled,
            vec![
                ("15-18", 1),
                ("19-21", 1),
                ("22-24", 0),
                ("25-27", 1),
                ("28-30", 0),
                ("30-above", 1),
            ]
        );
        assert_eq!(Summary::from_records(&records).banded_total(), 4);
    }

    #[test]
    fn test_age_distribution_skips_invalid_and_young() {
        let records = vec![
            person(json!("abc"), "M", "X"),
            person(json!(12), "M", "X"),
            person(json!("22"), "M", "X"),
        ];
        let dist = age_distribution(&records);
        assert_eq!(dist.iter().map(|(_, c)| c).sum::<usize>(), 1);
        assert_eq!(dist[2], (AgeBand::From22To24, 1));
    }

    #[test]
    fn test_normalize_gender() {
        assert_eq!(normalize_gender("  male "), Some("Male".to_string()));
        assert_eq!(normalize_gender("FEMALE"), Some("Female".to_string()));
        assert_eq!(normalize_gender("fEmAlE"), Some("Female".to_string()));
        assert_eq!(normalize_gender("non-BINARY"), Some("Non-Binary".to_string()));
        assert_eq!(normalize_gender("prefer not to say"), Some("Prefer Not To Say".to_string()));
        assert_eq!(normalize_gender("   "), None);
        assert_eq!(normalize_gender(""), None);
    }

    #[test]
    fn test_gender_breakdown_merges_variants() {
        let records = vec![
            person(json!(20), "male", "A"),
            person(json!(20), " Male", "A"),
            person(json!(20), "MALE ", "B"),
            person(json!(20), "female", "B"),
            person(json!(20), "  ", "B"),
            Record::default(),
        ];

        assert_eq!(
            gender_breakdown(&records),
            vec![
                GroupTotal { label: "Male".to_string(), value: 3 },
                GroupTotal { label: "Female".to_string(), value: 1 },
            ]
        );
    }

    #[test]
    fn test_group_count_orders_by_count_then_label() {
        let items = ["b", "a", "c", "b", "a", "d"];
        let groups = group_count(&items, |s| Some(s.to_string()));
        let order: Vec<(&str, usize)> = groups.iter().map(|g| (g.label.as_str(), g.value)).collect();
        assert_eq!(order, vec![("a", 2), ("b", 2), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn test_group_sum() {
        let rows = [("IIT", Some(10.0)), ("NIT", Some(4.0)), ("IIT", Some(2.5)), ("NIT", None)];
        let groups = group_sum(&rows, |r| Some(r.0.to_string()), |r| r.1);
        assert_eq!(
            groups,
            vec![
                GroupTotal { label: "IIT".to_string(), value: 12.5 },
                GroupTotal { label: "NIT".to_string(), value: 4.0 },
            ]
        );
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = vec![
            person(json!(19), "male", "A"),
            person(json!(23), "female", "B"),
            person(json!(31), "Female", "B"),
        ];
        let first = Summary::from_records(&records);
        let second = Summary::from_records(&records);
        assert_eq!(first, second);

        let sums_a = group_sum(&records, |r| r.affiliation.clone(), Record::age_years);
        let sums_b = group_sum(&records, |r| r.affiliation.clone(), Record::age_years);
        assert_eq!(sums_a, sums_b);
    }

    #[test]
    fn test_summary_totals() {
        let records = vec![
            person(json!(20), "male", "IIT Delhi"),
            person(json!("30"), "female", " IIT Delhi "),
            person(json!("n/a"), "female", "BITS"),
            person(json!(22), "male", ""),
        ];
        let summary = Summary::from_records(&records);

        assert_eq!(summary.total_registrants, 4);
        assert_eq!(summary.with_valid_age, 3);
        assert_eq!(summary.average_age, Some(24.0));
        assert_eq!(summary.distinct_affiliations, 2);
        assert_eq!(summary.top_affiliations(1)[0].label, "IIT Delhi");
        assert_eq!(summary.top_affiliations(1)[0].value, 2);
        assert_eq!(summary.top_affiliations(10).len(), 2);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = Summary::from_records(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.average_age, None);
        assert_eq!(summary.age_groups.len(), 6);
        assert!(summary.genders.is_empty());
    }
}
