//! Reading Sphinx `objects.inv` inventories into an [`EntryIndex`].
//!
//! A version 2 inventory is four `#`-prefixed header lines followed by a
//! zlib-compressed body with one entry per line:
//!
//! ```text
//! name domain:role priority location display-name
//! ```
//!
//! A location ending in `$` is shorthand for the location followed by the
//! entry's name, and a display name of `-` means "same as the name".
//! Version 1 inventories (uncompressed, Python objects only) are accepted
//! as well.
//!
//! Inventories come from a local file or are downloaded from the
//! documentation site, see [`Source`].

use std::{
    collections::HashSet,
    fmt,
    io::Read,
    path::{Path, PathBuf},
};

use flate2::read::ZlibDecoder;

use crate::{
    entry::Entry,
    error::{Error, Result},
    index::EntryIndex,
};

/// Conventional file name of a Sphinx inventory.
pub const INVENTORY_FILE_NAME: &str = "objects.inv";

/// Sent with every inventory download.
pub const USER_AGENT: &str =
    concat!("sphinxbert/", env!("CARGO_PKG_VERSION"));

const HEADER_V1: &str = "# Sphinx inventory version 1";
const HEADER_V2: &str = "# Sphinx inventory version 2";

/// Where an inventory is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// The inventory published next to the documentation at `base_url`.
    pub fn published(base_url: &str) -> Self {
        Self::Url(join_url(base_url, INVENTORY_FILE_NAME))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// HTTP client used for inventory downloads.
pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Download and parse the inventory at `url`.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    base_url: &str,
) -> Result<EntryIndex> {
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    let index = parse(&bytes, base_url)?;
    tracing::info!(
        url,
        project = index.project(),
        version = index.version(),
        entries = index.len(),
        "downloaded inventory"
    );
    Ok(index)
}

/// Load an inventory from either kind of [`Source`].
///
/// File reads run on the blocking pool.
pub async fn load_source(
    client: &reqwest::Client,
    source: &Source,
    base_url: &str,
) -> Result<EntryIndex> {
    match source {
        Source::File(path) => {
            let path = path.clone();
            let base_url = base_url.to_string();
            tokio::task::spawn_blocking(move || load(&path, &base_url))
                .await
                .map_err(|e| {
                    Error::Inventory(format!("inventory load task failed: {e}"))
                })?
        }
        Source::Url(url) => fetch(client, url, base_url).await,
    }
}

/// Read and parse the inventory at `path`.
pub fn load(path: &Path, base_url: &str) -> Result<EntryIndex> {
    let bytes = std::fs::read(path)?;
    let index = parse(&bytes, base_url)?;
    tracing::info!(
        path = %path.display(),
        project = index.project(),
        version = index.version(),
        entries = index.len(),
        "loaded inventory"
    );
    Ok(index)
}

/// Parse raw inventory bytes. Relative locations are resolved against
/// `base_url`.
pub fn parse(bytes: &[u8], base_url: &str) -> Result<EntryIndex> {
    let mut reader = HeaderReader { rest: bytes };

    let version_line = reader.line()?;
    match version_line.trim_end() {
        HEADER_V1 => parse_v1(&mut reader, base_url),
        HEADER_V2 => parse_v2(&mut reader, base_url),
        other => Err(Error::Inventory(format!(
            "unsupported inventory header: {other:?}"
        ))),
    }
}

fn parse_v1(reader: &mut HeaderReader<'_>, base_url: &str) -> Result<EntryIndex> {
    let project = reader.field("Project")?;
    let version = reader.field("Version")?;
    let body = std::str::from_utf8(reader.rest)
        .map_err(|e| Error::Inventory(format!("body is not UTF-8: {e}")))?;

    let mut entries = Vec::new();
    for line in body.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(kind), Some(location)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let (domain, location) = if kind == "mod" {
            ("py:module".to_string(), format!("{location}#module-{name}"))
        } else {
            (format!("py:{kind}"), format!("{location}#{name}"))
        };
        entries.push(make_entry(name, &domain, &location, "-", base_url));
    }

    Ok(EntryIndex::new(project, version, base_url, entries))
}

fn parse_v2(reader: &mut HeaderReader<'_>, base_url: &str) -> Result<EntryIndex> {
    let project = reader.field("Project")?;
    let version = reader.field("Version")?;
    let compression = reader.line()?;
    if !compression.contains("zlib") {
        return Err(Error::Inventory(format!(
            "unsupported compression: {compression:?}"
        )));
    }

    let mut body = String::new();
    ZlibDecoder::new(reader.rest)
        .read_to_string(&mut body)
        .map_err(|e| Error::Inventory(format!("cannot decompress body: {e}")))?;

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for line in body.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let Some(raw) = RawLine::parse(line) else {
            skipped += 1;
            continue;
        };
        if !seen.insert((raw.domain, raw.name)) {
            continue;
        }
        entries.push(make_entry(
            raw.name,
            raw.domain,
            raw.location,
            raw.display_name,
            base_url,
        ));
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped malformed inventory lines");
    }

    Ok(EntryIndex::new(project, version, base_url, entries))
}

fn make_entry(
    name: &str,
    domain: &str,
    location: &str,
    display_name: &str,
    base_url: &str,
) -> Entry {
    let location = match location.strip_suffix('$') {
        Some(prefix) => format!("{prefix}{name}"),
        None => location.to_string(),
    };
    let display_name = match display_name.trim() {
        "" | "-" => None,
        other => Some(other.to_string()),
    };
    Entry::new(name, join_url(base_url, &location))
        .with_domain(domain)
        .with_display_name(display_name)
}

/// Resolve an inventory location against the documentation root.
///
/// Absolute URLs are returned unchanged; everything else is appended to
/// `base_url` with exactly one `/` in between.
pub fn join_url(base_url: &str, location: &str) -> String {
    if location.contains("://") || base_url.is_empty() {
        return location.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let location = location.trim_start_matches('/');
    format!("{base}/{location}")
}

/// One body line split into its fields.
#[derive(Debug, PartialEq)]
struct RawLine<'a> {
    name: &'a str,
    domain: &'a str,
    location: &'a str,
    display_name: &'a str,
}

impl<'a> RawLine<'a> {
    /// Names may contain spaces, so take the shortest name after which the
    /// rest of the line still reads as `domain:role priority location`.
    fn parse(line: &'a str) -> Option<Self> {
        line.char_indices()
            .filter(|&(i, c)| i > 0 && c.is_whitespace())
            .find_map(|(i, _)| Self::parse_at(line, i))
    }

    fn parse_at(line: &'a str, split: usize) -> Option<Self> {
        let name = line[..split].trim_end();
        let (domain, rest) = next_field(&line[split..])?;
        if name.is_empty() || !domain.contains(':') {
            return None;
        }
        let (priority, rest) = next_field(rest)?;
        priority.parse::<i32>().ok()?;
        let (location, rest) = next_field(rest)?;

        Some(Self {
            name,
            domain,
            location,
            display_name: rest.trim(),
        })
    }
}

fn next_field(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some((&text[..end], &text[end..]))
}

struct HeaderReader<'a> {
    rest: &'a [u8],
}

impl<'a> HeaderReader<'a> {
    fn line(&mut self) -> Result<&'a str> {
        let bytes: &'a [u8] = self.rest;
        let end = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| Error::Inventory("truncated header".into()))?;
        let (line, rest) = bytes.split_at(end);
        self.rest = &rest[1..];
        std::str::from_utf8(line)
            .map_err(|e| Error::Inventory(format!("header is not UTF-8: {e}")))
    }

    fn field(&mut self, key: &str) -> Result<String> {
        let line = self.line()?;
        let prefix = format!("# {key}: ");
        line.trim_end()
            .strip_prefix(&prefix)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Inventory(format!(
                    "expected `{prefix}` header line, got {line:?}"
                ))
            })
    }
}
