//! Brand identifiers and search-query variant generation.

/// A brand name as read from the source, with its normalized lookup key.
///
/// The original casing is preserved for search queries and output; the
/// normalized key (trimmed, lowercased) is used for override lookups and
/// deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    name: String,
}

impl Brand {
    /// Creates a brand from a raw cell value.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the brand name as read from the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized lookup key (trimmed, lowercased).
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// Generates search-query variants for the fallback strategy.
    ///
    /// Order matters: verbatim first, then upper, lower, hyphenated, and
    /// quoted-exact. Duplicates (e.g. an already-lowercase name) are removed
    /// while preserving order.
    pub fn variants(&self) -> Vec<String> {
        let verbatim = self.name.trim().to_string();
        let mut out = Vec::with_capacity(5);
        let mut push = |v: String| {
            if !v.is_empty() && !out.contains(&v) {
                out.push(v);
            }
        };

        push(verbatim.clone());
        push(verbatim.to_uppercase());
        push(verbatim.to_lowercase());
        if verbatim.contains(' ') {
            push(verbatim.replace(' ', "-"));
        }
        push(format!("\"{}\"", verbatim));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        assert_eq!(Brand::new("  Acme Corp ").key(), "acme corp");
        assert_eq!(Brand::new("ACME").key(), "acme");
        assert_eq!(Brand::new("acme").key(), "acme");
    }

    #[test]
    fn test_name_preserves_case() {
        let brand = Brand::new("AcMe");
        assert_eq!(brand.name(), "AcMe");
    }

    #[test]
    fn test_variants_full_set() {
        let variants = Brand::new("Acme Corp").variants();
        assert_eq!(
            variants,
            vec!["Acme Corp", "ACME CORP", "acme corp", "Acme-Corp", "\"Acme Corp\""]
        );
    }

    #[test]
    fn test_variants_dedup() {
        // Single lowercase word: verbatim == lower, no hyphenated form
        let variants = Brand::new("acme").variants();
        assert_eq!(variants, vec!["acme", "ACME", "\"acme\""]);
    }

    #[test]
    fn test_variants_trimmed() {
        let variants = Brand::new("  Acme  ").variants();
        assert_eq!(variants[0], "Acme");
    }
}
