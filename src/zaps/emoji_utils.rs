/// Normalizes reaction content into the emoji it is displayed as.
///
/// Returns `None` for content that is not a recognizable reaction.
pub fn normalize_reaction(content: &str) -> Option<String> {
    match content {
        "+" | "" => Some("👍".to_string()),
        "-" => Some("👎".to_string()),
        // NIP-30 custom emoji shortcode, resolved against the emoji packs at render time
        shortcode if is_shortcode(shortcode) => Some(shortcode.to_string()),
        emoji if is_valid_emoji(emoji) => Some(strip_modifiers(emoji)),
        _ => None,
    }
}

fn is_shortcode(s: &str) -> bool {
    s.len() > 2
        && s.starts_with(':')
        && s.ends_with(':')
        && s[1..s.len() - 1]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Checks if a string is a short emoji or emoji sequence
pub fn is_valid_emoji(s: &str) -> bool {
    if s.is_empty() || s.len() > 50 {
        return false;
    }
    s.chars().any(is_emoji_char)
}

fn is_emoji_char(ch: char) -> bool {
    matches!(ch as u32,
        0x1F600..=0x1F64F | // Emoticons
        0x1F300..=0x1F5FF | // Misc Symbols and Pictographs
        0x1F680..=0x1F6FF | // Transport and Map
        0x1F900..=0x1F9FF | // Supplemental Symbols and Pictographs
        0x1F1E0..=0x1F1FF | // Regional indicators
        0x2600..=0x26FF |   // Misc symbols
        0x2700..=0x27BF     // Dingbats
    )
}

/// Removes skin tone modifiers and variation selectors
pub fn strip_modifiers(emoji: &str) -> String {
    const MODIFIERS: [char; 6] = [
        '\u{1F3FB}',
        '\u{1F3FC}',
        '\u{1F3FD}',
        '\u{1F3FE}',
        '\u{1F3FF}',
        '\u{FE0F}',
    ];
    emoji.chars().filter(|c| !MODIFIERS.contains(c)).collect()
}
