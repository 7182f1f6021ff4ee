use super::model::ReferenceLibrary;

/// Return indices of records whose name contains `query`, case-insensitive
/// and unanchored, in reference-table order.
///
/// An empty (or all-whitespace) query matches nothing: searching only starts
/// once text has been entered.
pub fn search_by_name(library: &ReferenceLibrary, query: &str) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    library
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.name.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}
