//! LLM response validation
//!
//! Model output is untrusted text. This layer recovers a JSON value from it;
//! schema checks happen where the value is deserialized.

mod json_repair;

pub use json_repair::{JsonRepairer, RepairError, extract_json_from_response};
