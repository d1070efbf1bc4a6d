use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column name for the registrant identifier.
pub const FIELD_ID: &str = "Id";

/// Column name for the registrant's full name.
pub const FIELD_FULL_NAME: &str = "Full Name";

/// Column name for the college/company/organization the registrant belongs to.
pub const FIELD_AFFILIATION: &str = "Affiliation (College/Company/Organization Name)";

/// Column name for age. Values arrive as numbers, numeric strings, or garbage.
pub const FIELD_AGE: &str = "Age";

/// Column name for free-text gender.
pub const FIELD_GENDER: &str = "Gender";

/// One registrant row as returned by the table API.
///
/// Fields are kept untyped at the boundary: the store does not validate its
/// columns, so coercion happens in the accessors rather than during parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "Full Name", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(
        rename = "Affiliation (College/Company/Organization Name)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub affiliation: Option<String>,
    #[serde(rename = "Age", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
    #[serde(rename = "Gender", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Any other selected columns, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Build a record from string cells keyed by column name.
    /// Used by the CSV snapshot reader, where every cell is text.
    pub fn from_columns<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Record::default();
        for (name, value) in columns {
            if value.is_empty() {
                continue;
            }
            match name {
                FIELD_ID => record.id = Some(Value::String(value.to_string())),
                FIELD_FULL_NAME => record.full_name = Some(value.to_string()),
                FIELD_AFFILIATION => record.affiliation = Some(value.to_string()),
                FIELD_AGE => record.age = Some(Value::String(value.to_string())),
                FIELD_GENDER => record.gender = Some(value.to_string()),
                other => {
                    record
                        .extra
                        .insert(other.to_string(), Value::String(value.to_string()));
                }
            }
        }
        record
    }

    /// Age as a number. Invalid or missing values are `None`.
    pub fn age_years(&self) -> Option<f64> {
        let years = match self.age.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        years.is_finite().then_some(years)
    }

    /// Identifier rendered as text (the store returns integers, CSV exports strings)
    pub fn id_display(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("(unnamed)")
    }

    /// Affiliation with surrounding whitespace removed; empty is missing.
    pub fn affiliation_name(&self) -> Option<&str> {
        self.affiliation
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Response envelope of one page of the table API.
#[derive(Debug, Deserialize)]
pub struct PageResponse {
    pub list: Vec<Record>,
}
