use lazy_static::lazy_static;
use regex::Regex;

/// A slug is valid when it is non-empty and carries none of the characters
/// that would break a URL path segment: whitespace, quotes, or
/// `; / \ ? & . < > : @ $ % ^ *`.
pub fn is_valid_slug(slug: &str) -> bool {
    lazy_static! {
        static ref FORBIDDEN_REGEX: Regex = Regex::new(
            r#"[\s'";/\\?&.<>:@$%^*]"#
        ).unwrap();
    }

    !slug.is_empty() && !FORBIDDEN_REGEX.is_match(slug)
}

/// Builds a slug from a post title, e.g. `Hello, Wörld!` becomes `hello-world`.
/// The result is either empty or a valid slug.
pub fn suggest_slug(title: &str) -> String {
    let ascii = unidecode::unidecode(title);
    let alpha_chars: String = ascii.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();

    alpha_chars.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
