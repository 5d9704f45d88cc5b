//! JSON serialization for partition reports.

use crate::types::PartitionReport;

/// Serialize a PartitionReport to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for PartitionReport).
pub fn to_json(report: &PartitionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a PartitionReport to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for PartitionReport).
pub fn to_json_pretty(report: &PartitionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
