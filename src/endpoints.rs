//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/records/{record_id}', use [format_endpoint].

use crate::database_id::RecordId;

/// The root route, reports whether the service is up.
pub const ROOT: &str = "/";
/// The route to list and create records.
pub const RECORDS: &str = "/records";
/// The route to access a single record.
pub const RECORD: &str = "/records/{record_id}";
/// The route for income and expense totals over a date range.
pub const RECORDS_SUMMARY: &str = "/records/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the first run of text wrapped in braces, e.g. `{record_id}`
/// in '/records/{record_id}'. An unclosed brace is treated as running to the
/// end of the path.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: RecordId) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
