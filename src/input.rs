//! Parsing of submitted affiliation-number lists.

/// Result of parsing a raw identifier list.
#[derive(Debug, Default)]
pub struct AffnoList {
    /// Valid affiliation numbers, in submission order. Duplicates are
    /// kept; each occurrence is scheduled as its own item.
    pub affnos: Vec<u32>,
    /// Tokens that did not parse as affiliation numbers (for logging).
    pub skipped: Vec<String>,
}

impl AffnoList {
    /// Returns true if no valid affiliation numbers were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.affnos.is_empty()
    }

    /// Returns the count of valid affiliation numbers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.affnos.len()
    }
}

/// Parses a comma-separated list of affiliation numbers.
///
/// Tokens are trimmed; empty tokens (e.g. from a trailing comma) are
/// dropped silently, and tokens that do not parse as a number are
/// collected into `skipped` so the caller can log them.
#[must_use]
pub fn parse_affno_list(raw: &str) -> AffnoList {
    let mut result = AffnoList::default();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<u32>() {
            Ok(affno) => result.affnos.push(affno),
            Err(_) => result.skipped.push(token.to_string()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_list() {
        let parsed = parse_affno_list("1030005,1030006,1030007");
        assert_eq!(parsed.affnos, vec![1030005, 1030006, 1030007]);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse_affno_list(" 100 ,\t200 , 300");
        assert_eq!(parsed.affnos, vec![100, 200, 300]);
    }

    #[test]
    fn test_parse_collects_garbage_tokens() {
        let parsed = parse_affno_list("100,abc,200,12x4");
        assert_eq!(parsed.affnos, vec![100, 200]);
        assert_eq!(parsed.skipped, vec!["abc", "12x4"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let parsed = parse_affno_list("5,5,5");
        assert_eq!(parsed.affnos, vec![5, 5, 5]);
    }

    #[test]
    fn test_parse_ignores_empty_tokens() {
        let parsed = parse_affno_list("100,,200,");
        assert_eq!(parsed.affnos, vec![100, 200]);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_parse_all_garbage_is_empty() {
        let parsed = parse_affno_list("foo, bar, ");
        assert!(parsed.is_empty());
        assert_eq!(parsed.skipped.len(), 2);
    }

    #[test]
    fn test_parse_empty_input() {
        let parsed = parse_affno_list("");
        assert!(parsed.is_empty());
        assert_eq!(parsed.len(), 0);
    }
}
