//! Outbound HMDB links. Pure string templating; this crate performs no
//! network calls itself.

const HMDB_METABOLITE_BASE: &str = "https://hmdb.ca/metabolites";

/// Web page for a metabolite record.
pub fn metabolite_url(hmdb_id: &str) -> String {
    format!("{HMDB_METABOLITE_BASE}/{hmdb_id}")
}

/// Structure thumbnail for a metabolite record.
pub fn structure_image_url(hmdb_id: &str) -> String {
    format!("{HMDB_METABOLITE_BASE}/{hmdb_id}.png")
}
