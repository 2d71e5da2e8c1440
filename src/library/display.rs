use super::model::TrackMetadata;

/// Build the one-line label for a track: `"Artist1, Artist2 - Title"`, or just
/// the title when no artist is known.
pub fn display_line(title: &str, artists: &[String]) -> String {
    let artists: Vec<&str> = artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    if artists.is_empty() {
        title.trim().to_string()
    } else {
        format!("{} - {}", artists.join(", "), title.trim())
    }
}

/// Case-insensitive substring match over title, artists and album.
///
/// `query_lower` must already be lowercased.
pub fn matches_query(meta: &TrackMetadata, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }
    meta.title.to_lowercase().contains(query_lower)
        || meta.artists.join(", ").to_lowercase().contains(query_lower)
        || meta.album.to_lowercase().contains(query_lower)
}
