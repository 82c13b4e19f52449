//! Line segmentation
//!
//! Documents are compared at line granularity: every '\n'-delimited line,
//! empty lines included, becomes one scoring segment.

/// Split document text into its ordered segments.
///
/// Splitting an empty string yields a single empty segment, so every
/// document has at least one segment to embed. Carriage returns are not
/// stripped; the split is on '\n' only.
pub fn split(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}
