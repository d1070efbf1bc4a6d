//! Tab content renderers.

pub mod affiliations;
pub mod charts;
pub mod overview;
pub mod registrants;
pub mod tally;
