//! Stable identifiers derived from normalized titles

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// `<slug>-<8 hex>` for a title; a pure function of the title string
pub fn assign(normalized_title: &str) -> String {
    with_hash_input(normalized_title, normalized_title)
}

/// Identifier for a title inside a named category.
///
/// The category goes into the hashed input only, so the slug stays readable
/// while the same title in two catalogs gets two identifiers.
pub fn assign_with_category(normalized_title: &str, category: Option<&str>) -> String {
    match category.filter(|c| !c.is_empty()) {
        Some(category) => with_hash_input(normalized_title, &format!("{}:{}", category, normalized_title)),
        None => assign(normalized_title),
    }
}

fn with_hash_input(normalized_title: &str, hash_input: &str) -> String {
    let digest = format!("{:x}", md5::compute(hash_input.as_bytes()));
    format!("{}-{}", slugify(normalized_title), &digest[..8])
}

/// Lowercase, runs of non-alphanumerics become one hyphen, edges trimmed
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "title".to_string()
    } else {
        slug.to_string()
    }
}
