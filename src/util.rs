/// Two deterministic values in `[-1, 1]` derived from `id`.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let hash = blake3::hash(id.as_bytes());
    let bytes = hash.as_bytes();
    let unit = |offset: usize| {
        let word = u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        (word as f64 / u32::MAX as f64) as f32 * 2.0 - 1.0
    };
    (unit(0), unit(4))
}

/// Deterministic node id derived from where a node sits in its tree.
pub fn stable_id(prefix: &str, parent_id: &str, name: &str, position: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(parent_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(name.as_bytes());
    hasher.update(&[0]);
    hasher.update(&(position as u64).to_le_bytes());
    let hash = hasher.finalize();
    format!("{prefix}-{}", &hash.to_hex()[..12])
}

pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "node".to_owned()
    } else {
        slug
    }
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cuts `value` to at most `max_chars` characters, appending "..." when it
/// had to cut.
pub fn truncate_label(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }

    let mut cut = value.chars().take(max_chars).collect::<String>();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

pub fn word_count(value: &str) -> usize {
    value.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stable_id_depends_on_position_and_parent() {
        let a = stable_id("option", "topic-1", "Stay", 0);
        assert_eq!(a, stable_id("option", "topic-1", "Stay", 0));
        assert_ne!(a, stable_id("option", "topic-1", "Stay", 1));
        assert_ne!(a, stable_id("option", "topic-2", "Stay", 0));
        assert!(a.starts_with("option-"));
    }

    #[test]
    fn stable_pair_is_repeatable_and_bounded() {
        let pair = stable_pair("option-stay");
        assert_eq!(pair, stable_pair("option-stay"));
        assert_ne!(pair, stable_pair("option-switch"));
        assert!((-1.0..=1.0).contains(&pair.0) && (-1.0..=1.0).contains(&pair.1));
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Risk Factors: Money!"), "risk-factors-money");
        assert_eq!(slugify("   "), "node");
    }

    #[test]
    fn truncate_label_appends_ellipsis_only_when_cut() {
        assert_eq!(truncate_label("short", 30), "short");
        assert_eq!(truncate_label("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn capitalize_first_character() {
        assert_eq!(capitalize("switch jobs"), "Switch jobs");
        assert_eq!(capitalize(""), "");
    }
}
