//! Deterministic slugs for loan and category names

/// Lowercase ASCII alphanumerics joined by single dashes.
///
/// Non-ASCII characters and punctuation are dropped, so "Home & Car Loans!"
/// becomes `home-car-loans`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Personal Loan"), "personal-loan");
        assert_eq!(slugify("  Home & Car   Loans! "), "home-car-loans");
        assert_eq!(slugify("Two-Wheeler_Loan"), "two-wheeler-loan");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Gold Loan"), slugify("gold  loan"));
    }

    #[test]
    fn test_slugify_drops_symbols_only_names() {
        assert_eq!(slugify("!!!"), "");
    }
}
