//! Tolerant coercion of numeric-like free-text tag values (floor counts,
//! unit counts).  Real-world tagging is noisy: ranges, lists, decimal
//! commas, stray words.  The same coercion applies everywhere such fields
//! are consumed, so a value survives re-normalization unchanged.

/// Coerce a floor/unit tag value to an integer count.
///
/// - missing or empty → 0
/// - pure integer → itself
/// - range or list (`;`, `-`, `, ` delimited) → mean of the numeric tokens,
///   rounded; tokens keep only their digits; no numeric token at all → 1
/// - decimal string (comma or dot) → rounded
/// - anything else → its digits, or 1 when none remain
///
/// Rounding ties (`.5`) round half-up, a pinned convention.
pub fn normalize_count(value: Option<&str>) -> u32 {
    let Some(raw) = value else { return 0 };
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }

    if let Ok(n) = raw.parse::<u32>() {
        return n;
    }

    // Ranges and lists are averaged; `, ` before `,` so decimal commas
    // ("5,5") are not mistaken for lists.
    if raw.contains(';') || raw.contains('-') || raw.contains(", ") {
        let values: Vec<u32> = raw
            .replace(';', "*")
            .replace('-', "*")
            .replace(", ", "*")
            .split('*')
            .filter_map(|token| {
                let digits = keep_digits(token);
                if digits.is_empty() { None } else { digits.parse::<u32>().ok() }
            })
            .collect();
        if values.is_empty() {
            return 1;
        }
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
        return mean.round() as u32;
    }

    if raw.contains(',') || raw.contains('.') {
        if let Ok(v) = raw.replace(',', ".").parse::<f64>() {
            return v.max(0.0).round() as u32;
        }
    }

    let digits = keep_digits(raw);
    if digits.is_empty() {
        return 1;
    }
    digits.parse::<u32>().unwrap_or(1)
}

fn keep_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integers_pass_through() {
        assert_eq!(normalize_count(Some("5")), 5);
        assert_eq!(normalize_count(Some("12")), 12);
    }

    #[test]
    fn missing_and_empty_default_to_zero() {
        assert_eq!(normalize_count(None), 0);
        assert_eq!(normalize_count(Some("")), 0);
        assert_eq!(normalize_count(Some("  ")), 0);
    }

    #[test]
    fn ranges_average_and_round() {
        assert_eq!(normalize_count(Some("3-5")), 4);
        assert_eq!(normalize_count(Some("2;4")), 3);
        assert_eq!(normalize_count(Some("1;2;3")), 2);
    }

    #[test]
    fn list_midpoint_rounds_half_up() {
        assert_eq!(normalize_count(Some("2, 3")), 3);
    }

    #[test]
    fn decimal_comma_rounds() {
        assert_eq!(normalize_count(Some("5,5")), 6);
        assert_eq!(normalize_count(Some("4.2")), 4);
    }

    #[test]
    fn embedded_words_are_stripped() {
        assert_eq!(normalize_count(Some("5 этажей")), 5);
        assert_eq!(normalize_count(Some("примерно 9")), 9);
    }

    #[test]
    fn no_digits_defaults_to_one() {
        assert_eq!(normalize_count(Some("деревянный")), 1);
    }

    #[test]
    fn idempotent_on_normalized_values() {
        for v in ["0", "1", "7", "42"] {
            let once = normalize_count(Some(v));
            assert_eq!(normalize_count(Some(&once.to_string())), once);
        }
    }
}
