use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    index::EntryIndex,
    matcher::ScoredEntry,
    segment::{QueryToken, query_count},
    selector,
};

/// The markup a candidate message is written in.
///
/// `Html` output is a complete HTML fragment: links and literal text are
/// both escaped. `Markdown` output copies literal text unchanged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    /// `<a href="link">label</a>`, with label and link HTML-escaped.
    #[default]
    Html,
    /// `[label](link)`.
    Markdown,
}

impl LinkStyle {
    pub fn render(self, label: &str, link: &str) -> String {
        match self {
            Self::Html => format!(
                "<a href=\"{}\">{}</a>",
                escape_html(link),
                escape_html(label)
            ),
            Self::Markdown => format!("[{label}]({link})"),
        }
    }

    /// Plain text as it appears in the rendered message.
    pub fn literal(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Html => Cow::Owned(escape_html(text)),
            Self::Markdown => Cow::Borrowed(text),
        }
    }

    /// Text set in italics.
    pub fn emphasis(self, text: &str) -> String {
        match self {
            Self::Html => format!("<i>{}</i>", escape_html(text)),
            Self::Markdown => format!("*{text}*"),
        }
    }
}

/// One fully resolved message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate<'a> {
    /// The message with every query replaced by a link.
    pub text: String,
    /// The entry picked for each query token, in token order.
    pub choices: Vec<ScoredEntry<'a>>,
}

/// Number of candidates [`expand`] will produce for `tokens`.
///
/// Each query contributes `min(k, index_len)` options. Returns `None` if the
/// product does not fit in a `usize`.
pub fn combination_count(
    tokens: &[QueryToken],
    index_len: usize,
    k: usize,
) -> Option<usize> {
    let per_query = k.min(index_len);
    let exponent = u32::try_from(query_count(tokens)).ok()?;
    per_query.checked_pow(exponent)
}

/// Resolve every query token to its top `k` matches and build every
/// combination of one match per query.
///
/// Combinations are emitted in row-major order: the last query varies
/// fastest. If any query has no match the result is empty. Without query
/// tokens the literal text is returned as the only candidate. Output size
/// is not capped here; see [`combination_count`].
pub fn expand<'a>(
    tokens: &[QueryToken],
    index: &'a EntryIndex,
    k: usize,
    style: LinkStyle,
) -> Result<Vec<Candidate<'a>>> {
    let mut options: Vec<Vec<ScoredEntry<'a>>> = Vec::new();
    for token in tokens {
        if let QueryToken::Query(query) = token {
            let hits = selector::top(query, index, k)?;
            if hits.is_empty() {
                tracing::debug!(query = %query, "query has no matches");
                return Ok(Vec::new());
            }
            options.push(hits);
        }
    }

    let mut combinations: Vec<Vec<ScoredEntry<'a>>> = vec![Vec::new()];
    for hits in &options {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                hits.iter().map(move |hit| {
                    let mut next = prefix.clone();
                    next.push(*hit);
                    next
                })
            })
            .collect();
    }

    Ok(combinations
        .into_iter()
        .map(|choices| Candidate {
            text: render(tokens, &choices, style),
            choices,
        })
        .collect())
}

fn render(
    tokens: &[QueryToken],
    choices: &[ScoredEntry<'_>],
    style: LinkStyle,
) -> String {
    let mut chosen = choices.iter();
    let mut text = String::new();
    for token in tokens {
        match token {
            QueryToken::Literal(literal) => {
                text.push_str(&style.literal(literal))
            }
            QueryToken::Query(label) => {
                if let Some(choice) = chosen.next() {
                    text.push_str(&style.render(label, &choice.entry.link));
                }
            }
        }
    }
    text
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
