//! Image filename classifier.
//!
//! Layered, intentionally permissive: a stray non-image in the browsing set
//! costs one failed decode, a missed image costs a page of a chapter.

/// Canonical extensions, matched case-sensitively in this form and all-uppercase.
const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff", ".webp"];

/// Bare format tokens searched anywhere in the lowercased name.
const FORMAT_TOKENS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Which rule accepted a filename. Ordered by priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Exact suffix, as written or all-uppercase.
    Suffix,
    /// Same suffix check, on a hyphenated (generated/hashed) name.
    HyphenatedSuffix,
    /// Format token somewhere in the lowercased name (`cover.PNG.bak`, `scanpng`).
    Token,
    /// Case-insensitive suffix.
    LooseSuffix,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Suffix => "suffix",
            Rule::HyphenatedSuffix => "hyphenated-suffix",
            Rule::Token => "token",
            Rule::LooseSuffix => "loose-suffix",
        }
    }
}

fn exact_suffix(name: &str) -> bool {
    IMAGE_SUFFIXES
        .iter()
        .any(|ext| name.ends_with(ext) || name.ends_with(ext.to_uppercase().as_str()))
}

/// First rule that accepts `name`, or `None` for a non-image.
///
/// Rules 1 and 2 share one suffix check; the hyphen only changes which rule
/// gets reported.
pub fn matched_rule(name: &str) -> Option<Rule> {
    if exact_suffix(name) {
        return Some(if name.contains('-') {
            Rule::HyphenatedSuffix
        } else {
            Rule::Suffix
        });
    }

    let lower = name.to_lowercase();
    if FORMAT_TOKENS.iter().any(|tok| lower.contains(tok)) {
        return Some(Rule::Token);
    }
    if IMAGE_SUFFIXES
        .iter()
        .any(|ext| lower.ends_with(ext.to_lowercase().as_str()))
    {
        return Some(Rule::LooseSuffix);
    }
    None
}

/// Pure check, no I/O.
pub fn is_image(name: &str) -> bool {
    matched_rule(name).is_some()
}

/// Classifier carrying the session's debug setting.
#[derive(Clone, Copy, Debug, Default)]
pub struct Classifier {
    debug: bool,
}

impl Classifier {
    pub fn new(debug: bool) -> Self {
        Classifier { debug }
    }

    pub fn is_image(&self, name: &str) -> bool {
        let rule = matched_rule(name);
        if self.debug {
            match rule {
                Some(r) => log::debug!("classify: {} -> image ({})", name, r.name()),
                None => log::debug!("classify: {} -> not an image", name),
            }
        }
        rule.is_some()
    }
}
