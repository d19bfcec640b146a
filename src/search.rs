use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    config::{DEFAULT_MAX_COMBINATIONS, DEFAULT_MAX_QUERY_LEN, DEFAULT_PAGE_SIZE},
    error::{Error, Result},
    entry::Entry,
    expand::{self, LinkStyle},
    index::EntryIndex,
    matcher,
    segment::{self, DEFAULT_MARKER},
    selector::DEFAULT_RESULTS_PER_QUERY,
};

/// Caller-side limits and formatting for one search request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Matches kept per embedded query in an insert search.
    pub results_per_query: usize,
    /// Character enclosing embedded queries.
    pub marker: char,
    /// Longest accepted input, in characters.
    pub max_query_len: usize,
    /// Most candidates an insert search may produce.
    pub max_combinations: usize,
    /// Results per direct search page.
    pub page_size: usize,
    pub link_style: LinkStyle,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
            marker: DEFAULT_MARKER,
            max_query_len: DEFAULT_MAX_QUERY_LEN,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            page_size: DEFAULT_PAGE_SIZE,
            link_style: LinkStyle::default(),
        }
    }
}

/// One ranked entry of a direct search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectHit {
    /// 1-based position in the full ranking.
    pub rank: usize,
    pub score: f32,
    pub name: String,
    pub title: String,
    pub domain: String,
    pub link: String,
    pub description: String,
    /// Ready-to-send reply linking to the entry, in the configured style.
    pub text: String,
}

/// A page of direct search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectPage {
    pub query: String,
    pub page: usize,
    pub total: usize,
    pub has_more: bool,
    pub results: Vec<DirectHit>,
}

/// One selectable message produced by an insert search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertHit {
    pub text: String,
    pub title: String,
    /// Names of the chosen entries, comma separated.
    pub description: String,
    pub links: Vec<String>,
}

/// Outcome of [`handle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Response {
    Direct(DirectPage),
    Insert { results: Vec<InsertHit> },
}

/// Summary of the loaded documentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexInfo {
    pub project: String,
    pub version: String,
    pub base_url: String,
    pub entries: usize,
    pub domains: BTreeMap<String, usize>,
}

/// Whether `message` should be answered with an insert search, i.e. it
/// contains at least one complete marker pair.
pub fn is_insert_query(message: &str, marker: char) -> bool {
    segment::query_count(&segment::segment(message, marker)) > 0
}

/// Answer a free-form message: messages with
/// embedded queries get an insert search, everything else a direct search.
pub fn handle(
    index: &EntryIndex,
    message: &str,
    page: usize,
    options: &SearchOptions,
) -> Result<Response> {
    if is_insert_query(message, options.marker) {
        let results = insert_search(index, message, options)?;
        Ok(Response::Insert { results })
    } else {
        direct_search(index, message, page, options).map(Response::Direct)
    }
}

/// Rank the whole index against `query` and return one page of it.
///
/// A blank query yields an empty page rather than an error.
pub fn direct_search(
    index: &EntryIndex,
    query: &str,
    page: usize,
    options: &SearchOptions,
) -> Result<DirectPage> {
    check_length(query, options)?;

    if query.trim().is_empty() {
        return Ok(DirectPage {
            query: query.to_string(),
            page,
            total: 0,
            has_more: false,
            results: Vec::new(),
        });
    }

    let ranked = matcher::rank(query, index);
    let total = ranked.len();
    let start = page.saturating_mul(options.page_size).min(total);
    let end = start.saturating_add(options.page_size).min(total);

    let results = ranked[start..end]
        .iter()
        .enumerate()
        .map(|(i, scored)| {
            let entry = scored.entry;
            DirectHit {
                rank: start + i + 1,
                score: scored.score,
                name: entry.name.clone(),
                title: entry.title().to_string(),
                domain: entry.domain.clone(),
                link: entry.link.clone(),
                description: describe(index, entry.display_name.as_deref()),
                text: reply_text(index, entry, options.link_style),
            }
        })
        .collect();

    tracing::debug!(query, page, total, "direct search");

    Ok(DirectPage {
        query: query.to_string(),
        page,
        total,
        has_more: end < total,
        results,
    })
}

/// Expand every marker-enclosed query in `message` into linked candidates.
///
/// Messages without embedded queries produce no candidates. The number of
/// combinations is checked against `max_combinations` before any
/// expansion happens.
pub fn insert_search(
    index: &EntryIndex,
    message: &str,
    options: &SearchOptions,
) -> Result<Vec<InsertHit>> {
    check_length(message, options)?;

    let tokens = segment::segment(message, options.marker);
    if segment::query_count(&tokens) == 0 {
        return Ok(Vec::new());
    }

    let count = expand::combination_count(
        &tokens,
        index.len(),
        options.results_per_query,
    )
    .unwrap_or(usize::MAX);
    if count > options.max_combinations {
        tracing::warn!(
            count,
            limit = options.max_combinations,
            "insert search exceeds combination limit"
        );
        return Err(Error::TooManyCombinations {
            count,
            limit: options.max_combinations,
        });
    }

    let candidates = expand::expand(
        &tokens,
        index,
        options.results_per_query,
        options.link_style,
    )?;
    let title = format!("Insert links to the documentation of {}", index.project());

    Ok(candidates
        .into_iter()
        .map(|candidate| InsertHit {
            description: candidate
                .choices
                .iter()
                .map(|c| c.entry.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            links: candidate
                .choices
                .iter()
                .map(|c| c.entry.link.clone())
                .collect(),
            title: title.clone(),
            text: candidate.text,
        })
        .collect())
}

/// Project metadata and entry counts for the loaded index.
pub fn info(index: &EntryIndex) -> IndexInfo {
    IndexInfo {
        project: index.project().to_string(),
        version: index.version().to_string(),
        base_url: index.base_url().to_string(),
        entries: index.len(),
        domains: index
            .domain_counts()
            .into_iter()
            .map(|(domain, count)| (domain.to_string(), count))
            .collect(),
    }
}

fn check_length(text: &str, options: &SearchOptions) -> Result<()> {
    let len = text.chars().count();
    if len > options.max_query_len {
        return Err(Error::QueryTooLong {
            len,
            limit: options.max_query_len,
        });
    }
    Ok(())
}

fn describe(index: &EntryIndex, display_name: Option<&str>) -> String {
    match display_name {
        Some(display) => {
            format!("Documentation of {}, {display}", index.project())
        }
        None => format!("Documentation of {}", index.project()),
    }
}

/// The message a direct search answer sends: the project name followed by
/// a link labelled with the entry's title.
pub fn reply_text(
    index: &EntryIndex,
    entry: &Entry,
    style: LinkStyle,
) -> String {
    let link = style.render(entry.title(), &entry.link);
    if index.project().is_empty() {
        return link;
    }
    format!(
        "Documentation of {}: {link}",
        style.emphasis(index.project())
    )
}

/// Format a direct search page for terminal output.
pub fn format_human_direct(page: &DirectPage) {
    if page.results.is_empty() {
        println!("No results found.");
        return;
    }

    for hit in &page.results {
        println!("{:>3}. [{:.1}] {} ({})", hit.rank, hit.score, hit.name, hit.domain);
        println!("     {}", hit.text);
    }
    if page.has_more {
        println!(
            "\n{} of {} result(s), more with --page {}",
            page.results.len(),
            page.total,
            page.page + 1
        );
    } else {
        println!("\n{} of {} result(s)", page.results.len(), page.total);
    }
}

/// Format insert search candidates for terminal output.
pub fn format_human_insert(hits: &[InsertHit]) {
    if hits.is_empty() {
        println!("No combinations found.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{:>3}. {}", i + 1, hit.description);
        println!("     {}", hit.text);
    }
    println!("\n{} combination(s)", hits.len());
}

/// Print any serializable result as pretty JSON on stdout.
pub fn format_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Config(format!("cannot serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}
