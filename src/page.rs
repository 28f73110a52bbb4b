//! Page naming and classification.

/// Page names reachable without a session. `""` is the site root.
pub const PUBLIC_PAGES: [&str; 3] = ["", "index", "sign_up"];

/// Page names that require a session.
pub const PROTECTED_PAGES: [&str; 3] = ["feed", "profile", "upload"];

/// PageClass
///
/// The access category of a page. Every page name maps to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageClass {
    Public,
    Protected,
    Neutral,
}

/// page_name
///
/// Extracts the comparable name of a page from a path or bare file name: the last path
/// segment, lower-cased, with trailing slashes ignored and an `.html`/`.htm` extension
/// stripped. Query strings and fragments are dropped first.
///
/// `"/site/Feed.html"` -> `"feed"`, `"/"` -> `""`, `"sign_up.html/"` -> `"sign_up"`.
pub fn page_name(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let last = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    for extension in [".html", ".htm"] {
        if let Some(stem) = last.strip_suffix(extension) {
            return stem.to_string();
        }
    }
    last
}

/// classify
///
/// Pure and total. Takes a raw path and normalizes it with `page_name` exactly once.
pub fn classify(path: &str) -> PageClass {
    classify_name(&page_name(path))
}

/// classify_name
///
/// Classifies a name already produced by `page_name`. Applies no further normalization.
pub fn classify_name(name: &str) -> PageClass {
    if PUBLIC_PAGES.contains(&name) {
        PageClass::Public
    } else if PROTECTED_PAGES.contains(&name) {
        PageClass::Protected
    } else {
        PageClass::Neutral
    }
}

/// Case-insensitive page identity, used for self-redirect suppression.
pub fn same_page(a: &str, b: &str) -> bool {
    page_name(a) == page_name(b)
}
