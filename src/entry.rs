use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Characters left untouched when percent-encoding a slug.
const SLUG_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Domain assigned to entries that were not read from an inventory.
pub const DEFAULT_DOMAIN: &str = "std:label";

/// Sphinx's general-purpose domain: headlines, documents, labels, terms.
pub const GENERAL_DOMAIN_PREFIX: &str = "std:";

/// Weight of entries in [`GENERAL_DOMAIN_PREFIX`]. They rank slightly below
/// API objects on inexact matches.
pub const GENERAL_WEIGHT: f32 = 0.8;

/// The weight an entry in `domain` gets unless set explicitly.
pub fn domain_weight(domain: &str) -> f32 {
    if domain.starts_with(GENERAL_DOMAIN_PREFIX) {
        GENERAL_WEIGHT
    } else {
        1.0
    }
}

/// One documented object: a searchable name and the URL it lives at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// The searchable name, e.g. `telegram.Bot.send_message`.
    pub name: String,
    /// Absolute link to the entry's documentation.
    pub link: String,
    /// Sphinx `domain:role`, e.g. `py:method`.
    pub domain: String,
    /// Human-friendly title, when the inventory provides one.
    pub display_name: Option<String>,
    /// Multiplier applied to inexact similarity scores, capped at `1.0`.
    /// Follows the domain unless set with [`Entry::with_weight`].
    pub weight: f32,
}

impl Entry {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            display_name: None,
            weight: domain_weight(DEFAULT_DOMAIN),
        }
    }

    /// Build an entry whose link is `base_url#<slug of name>`.
    pub fn from_title(name: impl Into<String>, base_url: &str) -> Self {
        let name = name.into();
        let link = format!("{base_url}#{}", slugify(&name));
        Self::new(name, link)
    }

    /// Set the domain, and the weight that goes with it.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.weight = domain_weight(&self.domain);
        self
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// The title to show to users.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Turn a title into a stable URL fragment.
///
/// Lowercases, collapses every run of characters that are neither
/// alphanumeric nor `_` into a single `-`, trims dashes from both ends and
/// percent-encodes whatever non-ASCII letters remain.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    utf8_percent_encode(&slug, SLUG_SAFE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Getting Started -- Quick!"), "getting-started-quick");
    }

    #[test]
    fn slugify_keeps_underscores() {
        assert_eq!(slugify("send_message"), "send_message");
    }

    #[test]
    fn slugify_trims_edges() {
        assert_eq!(slugify("  ...Hello.  "), "hello");
    }

    #[test]
    fn slugify_encodes_non_ascii() {
        assert_eq!(slugify("Über"), "%C3%BCber");
    }

    #[test]
    fn slugify_is_stable() {
        assert_eq!(slugify("Foo Bar"), slugify("Foo Bar"));
    }

    #[test]
    fn from_title_builds_fragment_link() {
        let entry = Entry::from_title("Inline Mode", "https://docs.example/");
        assert_eq!(entry.link, "https://docs.example/#inline-mode");
        assert_eq!(entry.name, "Inline Mode");
    }

    #[test]
    fn weight_follows_domain() {
        let label = Entry::new("intro", "https://x/intro.html");
        assert_eq!(label.domain, DEFAULT_DOMAIN);
        assert_eq!(label.weight, GENERAL_WEIGHT);

        let method = Entry::new("Bot.send", "https://x/bot.html")
            .with_domain("py:method");
        assert_eq!(method.weight, 1.0);

        let doc = method.with_domain("std:doc");
        assert_eq!(doc.weight, GENERAL_WEIGHT);
    }

    #[test]
    fn explicit_weight_wins() {
        let entry = Entry::new("intro", "https://x/intro.html")
            .with_domain("py:function")
            .with_weight(0.5);
        assert_eq!(entry.weight, 0.5);
    }

    #[test]
    fn title_prefers_display_name() {
        let entry = Entry::new("intro", "https://x/intro.html")
            .with_display_name(Some("Introduction".to_string()));
        assert_eq!(entry.title(), "Introduction");

        let plain = Entry::new("intro", "https://x/intro.html");
        assert_eq!(plain.title(), "intro");
    }
}
