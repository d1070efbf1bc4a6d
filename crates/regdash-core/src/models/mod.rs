//! Data models for registration records.
//!
//! - `Record`: one registrant row as returned by the table API
//! - `PageResponse`: the `{"list": [...]}` envelope of a single page

pub mod record;

pub use record::{
    PageResponse, Record, FIELD_AFFILIATION, FIELD_AGE, FIELD_FULL_NAME, FIELD_GENDER, FIELD_ID,
};
