//! URL slugs for products and stories.

/// Lower-case ASCII alphanumerics joined by single dashes.
///
/// Any run of other characters becomes one `-`, and leading or trailing
/// separators are dropped.
///
/// ```
/// use roastline_core::slugify;
///
/// assert_eq!(slugify("Gayo Wine  Process (250g)"), "gayo-wine-process-250g");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Toraja Sapan"), "toraja-sapan");
        assert_eq!(slugify("  --Kintamani__Natural--  "), "kintamani-natural");
        assert_eq!(slugify("Café Über"), "caf-ber");
        assert_eq!(slugify("!!!"), "");
    }
}
