//! sphinxbert - fuzzy search over Sphinx documentation inventories.
//!
//! sphinxbert loads a Sphinx `objects.inv` inventory into an immutable
//! [`EntryIndex`] and answers two kinds of requests against it:
//!
//! - **direct search**: rank every entry against one query;
//! - **insert search**: resolve each `+query+` embedded in a message to its
//!   best matches and offer every combination as a ready-to-send message
//!   with the queries replaced by links.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sphinxbert::{inventory, search::{self, SearchOptions}};
//!
//! let index = inventory::load(
//!     Path::new("objects.inv"),
//!     "https://docs.python-telegram-bot.org/en/stable/",
//! )
//! .unwrap();
//! let options = SearchOptions::default();
//!
//! let page = search::direct_search(&index, "send_message", 0, &options).unwrap();
//! for hit in &page.results {
//!     println!("{:.1} {} {}", hit.score, hit.name, hit.link);
//! }
//!
//! let hits = search::insert_search(&index, "Use +Bot.send_message+", &options)
//!     .unwrap();
//! for hit in &hits {
//!     println!("{}", hit.text);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod expand;
pub mod index;
pub mod inventory;
pub mod matcher;
pub mod mcp;
pub mod search;
pub mod segment;
pub mod selector;

pub use config::Config;
pub use entry::Entry;
pub use error::{Error, Result};
pub use expand::{Candidate, LinkStyle, combination_count, expand};
pub use index::{EntryIndex, IndexHandle};
pub use matcher::{ScoredEntry, rank};
pub use segment::{QueryToken, segment};
pub use selector::top;
