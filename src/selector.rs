use crate::{
    error::{Error, Result},
    index::EntryIndex,
    matcher::{self, ScoredEntry},
};

/// Default number of matches kept per embedded query.
pub const DEFAULT_RESULTS_PER_QUERY: usize = 3;

/// The `k` best matches for `query`, a prefix of [`matcher::rank`].
///
/// Returns fewer than `k` entries only when the index is smaller than `k`.
pub fn top<'a>(
    query: &str,
    index: &'a EntryIndex,
    k: usize,
) -> Result<Vec<ScoredEntry<'a>>> {
    if k == 0 {
        return Err(Error::InvalidArgument(
            "number of results per query must be positive".into(),
        ));
    }

    let mut ranked = matcher::rank(query, index);
    ranked.truncate(k);
    Ok(ranked)
}

/// [`top`] for callers holding a signed count, rejecting negative values.
pub fn top_signed<'a>(
    query: &str,
    index: &'a EntryIndex,
    k: i64,
) -> Result<Vec<ScoredEntry<'a>>> {
    let k = usize::try_from(k).map_err(|_| {
        Error::InvalidArgument(format!(
            "number of results per query must be positive, got {k}"
        ))
    })?;
    top(query, index, k)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::entry::Entry;

    fn index_of(names: &[&str]) -> EntryIndex {
        EntryIndex::from_entries(
            names
                .iter()
                .map(|n| Entry::new(*n, format!("https://docs.example/{n}")))
                .collect(),
        )
    }

    #[test]
    fn zero_k_is_rejected() {
        let index = index_of(&["a"]);
        assert!(matches!(
            top("a", &index, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn negative_k_is_rejected() {
        let index = index_of(&["a"]);
        assert!(matches!(
            top_signed("a", &index, -1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            top_signed("a", &index, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn positive_signed_k_matches_top() {
        let index = index_of(&["a", "b", "c"]);
        let signed = top_signed("b", &index, 2).unwrap();
        let unsigned = top("b", &index, 2).unwrap();
        assert_eq!(signed, unsigned);
    }

    #[test]
    fn small_index_returns_everything() {
        let index = index_of(&["a", "b"]);
        assert_eq!(top("a", &index, 3).unwrap().len(), 2);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = EntryIndex::default();
        assert!(top("a", &index, 3).unwrap().is_empty());
    }

    #[test]
    fn best_match_comes_first() {
        let index = index_of(&["Bot.send_photo", "Bot.send_message", "Chat"]);
        let hits = top("send_message", &index, 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.name, "Bot.send_message");
    }

    proptest! {
        #[test]
        fn top_is_a_prefix_of_rank(
            names in prop::collection::vec("[a-z._]{0,12}", 0..20),
            query in "[a-zA-Z._]{0,10}",
            k in 1usize..8,
        ) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let index = index_of(&refs);

            let ranked = matcher::rank(&query, &index);
            let best = top(&query, &index, k).unwrap();

            prop_assert_eq!(best.len(), k.min(index.len()));
            prop_assert_eq!(&ranked[..best.len()], &best[..]);
        }
    }
}
