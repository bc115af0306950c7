//! Provisioning Operations
//!
//! Storage-domain helpers built on the array client: hosts, storage groups
//! and director ports under the `sloprovisioning` category. Every helper
//! addresses the client's default array.

pub mod host;
pub mod port;
pub mod storage_group;

pub use host::*;
pub use port::*;
pub use storage_group::*;

use crate::client::system::string_list;
use crate::uri::ResourceArgs;
use serde_json::Value;

/// API category for provisioning resources
pub const CATEGORY: &str = "sloprovisioning";

/// Legacy address of a provisioning collection on an array
pub(crate) fn sloprovisioning(array_id: &str, resource_type: &str) -> ResourceArgs {
    ResourceArgs::legacy(array_id, CATEGORY, resource_type)
}

/// Read the string list `key` from a resource body.
///
/// Bodies arrive either bare or wrapped as `{wrapper: [record, ...]}`; the
/// first record is used. `None` when the field is absent.
pub(crate) fn record_field_list(body: Option<&Value>, wrapper: &str, key: &str) -> Option<Vec<String>> {
    let body = body?;
    let record = match body.get(wrapper).and_then(Value::as_array) {
        Some(items) => items.first()?,
        None => body,
    };
    record.get(key)?;
    Some(string_list(Some(record), key))
}
