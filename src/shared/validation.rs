use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for URL slugs (category slugs, media folder names)
    /// Must be lowercase alphanumeric with single hyphens between words
    /// - Valid: "summer-sale", "news", "x1-series"
    /// - Invalid: "-news", "news-", "summer--sale", "News", "summer_sale"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Turn a display name into a slug candidate ("Summer Sale!" -> "summer-sale")
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}
