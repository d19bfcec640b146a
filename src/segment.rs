use serde::Serialize;

/// Character that opens and closes an embedded query by default.
pub const DEFAULT_MARKER: char = '+';

/// One piece of a segmented message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum QueryToken {
    /// Text copied into every candidate as-is.
    Literal(String),
    /// Text that was enclosed in markers, without the markers.
    Query(String),
}

impl QueryToken {
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Query(text) => text,
        }
    }
}

/// Split `message` into literal and query tokens.
///
/// `marker` toggles between literal and query mode. Adjacent literal text is
/// merged into one token and empty literals are never emitted; a query may
/// be empty (`++`). If the last marker is never closed, that marker and
/// everything after it stay literal text.
pub fn segment(message: &str, marker: char) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = message;

    while let Some(open) = rest.find(marker) {
        let after_open = &rest[open + marker.len_utf8()..];
        let Some(close) = after_open.find(marker) else {
            break;
        };

        literal.push_str(&rest[..open]);
        if !literal.is_empty() {
            tokens.push(QueryToken::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(QueryToken::Query(after_open[..close].to_string()));
        rest = &after_open[close + marker.len_utf8()..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(QueryToken::Literal(literal));
    }
    tokens
}

/// Number of query tokens in `tokens`.
pub fn query_count(tokens: &[QueryToken]) -> usize {
    tokens.iter().filter(|t| t.is_query()).count()
}

/// Rebuild the original message, re-wrapping queries in `marker`.
pub fn reassemble(tokens: &[QueryToken], marker: char) -> String {
    let mut message = String::new();
    for token in tokens {
        match token {
            QueryToken::Literal(text) => message.push_str(text),
            QueryToken::Query(text) => {
                message.push(marker);
                message.push_str(text);
                message.push(marker);
            }
        }
    }
    message
}
