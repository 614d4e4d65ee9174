//! Canonical field value normalization.

/// Semantic role of a field, which decides how its raw value is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Email addresses are lowercased.
    Email,
    /// URLs are case-sensitive and pass through unmodified.
    Website,
    /// Everything else is title-cased.
    General,
}

/// Normalizes a raw field value according to its semantic role.
///
/// Rules, in precedence order:
/// 1. A value equal to `"N/A"` (case-insensitive) stays the literal `N/A`
///    regardless of role.
/// 2. Email values are lowercased.
/// 3. Website values pass through unchanged.
/// 4. Everything else is title-cased, with the whole-word tokens `Am`/`Pm`
///    restored to uppercase `AM`/`PM` (title-casing would otherwise mangle
///    time-of-day abbreviations in opening dates and the like).
///
/// Total function: every input string has a defined output.
#[must_use]
pub fn normalize(role: FieldRole, raw: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("N/A") {
        return "N/A".to_string();
    }
    match role {
        FieldRole::Email => raw.to_lowercase(),
        FieldRole::Website => raw.to_string(),
        FieldRole::General => title_case(raw),
    }
}

/// Title-cases whitespace-delimited words: first letter uppercased, the
/// rest lowercased. `Am`/`Pm` tokens are forced back to `AM`/`PM`.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for word in value.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        let cased = title_case_word(word);
        match cased.as_str() {
            "Am" => out.push_str("AM"),
            "Pm" => out.push_str("PM"),
            _ => out.push_str(&cased),
        }
    }
    out
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
