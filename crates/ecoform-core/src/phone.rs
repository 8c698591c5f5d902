//! Phone number validation and normalization.
//!
//! Numbers without a country code are interpreted under the default
//! region (US) and must be valid NANP numbers: ten digits with area code
//! and exchange in 2-9. Numbers with an explicit `+CC` prefix are held to
//! E.164 length rules. Accepted values are rewritten to international
//! format, and the rewritten form re-normalizes to itself.

use std::sync::OnceLock;

use regex::Regex;

fn shape_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9 ().-]+$").expect("phone shape pattern is valid"))
}

/// Normalize `raw` to international format, or `None` if it is not a
/// valid number.
pub(crate) fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !shape_pattern().is_match(trimmed) {
        return None;
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if trimmed.starts_with('+') {
        if let Some(national) = digits.strip_prefix('1') {
            return format_nanp(national);
        }
        // E.164: 8-15 digits, country code never starts with zero.
        if digits.len() < 8 || digits.len() > 15 || digits.starts_with('0') {
            return None;
        }
        return Some(format!("+{digits}"));
    }

    // Default region: tolerate a leading trunk `1` on eleven digits.
    let national = match digits.strip_prefix('1') {
        Some(rest) if rest.len() == 10 => rest,
        _ => digits.as_str(),
    };
    format_nanp(national)
}

fn format_nanp(digits: &str) -> Option<String> {
    if digits.len() != 10 {
        return None;
    }
    let bytes = digits.as_bytes();
    if !(b'2'..=b'9').contains(&bytes[0]) || !(b'2'..=b'9').contains(&bytes[3]) {
        return None;
    }
    Some(format!(
        "+1 {}-{}-{}",
        &digits[..3],
        &digits[3..6],
        &digits[6..]
    ))
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn formats_default_region_numbers() {
        assert_eq!(
            normalize("212-555-0100").as_deref(),
            Some("+1 212-555-0100")
        );
        assert_eq!(
            normalize("(212) 555-0100").as_deref(),
            Some("+1 212-555-0100")
        );
        assert_eq!(
            normalize("1 212 555 0100").as_deref(),
            Some("+1 212-555-0100")
        );
    }

    #[test]
    fn accepts_explicit_country_codes() {
        assert_eq!(
            normalize("+1 (212) 555-0100").as_deref(),
            Some("+1 212-555-0100")
        );
        assert_eq!(
            normalize("+44 20 7946 0958").as_deref(),
            Some("+442079460958")
        );
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert_eq!(normalize("555-0100"), None);
        assert_eq!(normalize("123-456-7890"), None); // area code 1xx
        assert_eq!(normalize("212-155-0100"), None); // exchange 1xx
        assert_eq!(normalize("not a number"), None);
        assert_eq!(normalize("+0 123 456 789"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("212-555-0100").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);

        let intl = normalize("+44 20 7946 0958").unwrap();
        assert_eq!(normalize(&intl).unwrap(), intl);
    }
}
