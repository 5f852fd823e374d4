/// Format a height in decimetres as metres, e.g. `7` -> `"0.7 m"`
pub fn format_height(decimetres: u32) -> String {
    format!("{}.{} m", decimetres / 10, decimetres % 10)
}

/// Format a weight in hectograms as kilograms, e.g. `69` -> `"6.9 kg"`
pub fn format_weight(hectograms: u32) -> String {
    format!("{}.{} kg", hectograms / 10, hectograms % 10)
}

/// Turn an API slug into a display name: `"mr-mime"` -> `"Mr Mime"`
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
