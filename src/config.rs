use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    expand::LinkStyle,
    inventory::Source,
    search::SearchOptions,
    segment::DEFAULT_MARKER,
    selector::DEFAULT_RESULTS_PER_QUERY,
};

/// Longest query the inline transport accepts, in characters.
pub const DEFAULT_MAX_QUERY_LEN: usize = 256;

/// Most results one inline answer can carry.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Most candidates an insert search may expand to.
pub const DEFAULT_MAX_COMBINATIONS: usize = DEFAULT_PAGE_SIZE;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Values given on the command line or through `SPHINXBERT_*` variables.
/// These win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub inventory: Option<PathBuf>,
    pub base_url: Option<String>,
    pub results_per_query: Option<usize>,
    pub marker: Option<char>,
    pub max_combinations: Option<usize>,
    pub refresh_minutes: Option<u64>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub inventory: Option<PathBuf>,
    pub base_url: Option<String>,
    pub results_per_query: Option<usize>,
    pub marker: Option<char>,
    pub max_combinations: Option<usize>,
    pub max_query_len: Option<usize>,
    pub page_size: Option<usize>,
    pub refresh_minutes: Option<u64>,
    pub link_style: Option<LinkStyle>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Locate and read the config file, in order of priority:
    /// 1. An explicit path (from --config or SPHINXBERT_CONFIG), which
    ///    must exist
    /// 2. `config.toml` in the XDG config directories, if present
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(Error::ConfigFile(path.to_path_buf()));
            }
            return Self::read(path).map(Some);
        }

        let found = xdg::BaseDirectories::with_prefix("sphinxbert")
            .find_config_file(CONFIG_FILE_NAME);
        match found {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using config file");
                Self::read(&path).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub inventory: Option<PathBuf>,
    pub base_url: String,
    pub results_per_query: usize,
    pub marker: char,
    pub max_combinations: usize,
    pub max_query_len: usize,
    pub page_size: usize,
    pub refresh_minutes: u64,
    pub link_style: LinkStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inventory: None,
            base_url: String::new(),
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
            marker: DEFAULT_MARKER,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            max_query_len: DEFAULT_MAX_QUERY_LEN,
            page_size: DEFAULT_PAGE_SIZE,
            refresh_minutes: 0,
            link_style: LinkStyle::default(),
        }
    }
}

impl Config {
    /// Merge overrides, then the config file, then defaults.
    pub fn resolve(
        overrides: &Overrides,
        file: Option<ConfigFile>,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let config = Self {
            inventory: overrides.inventory.clone().or(file.inventory),
            base_url: overrides
                .base_url
                .clone()
                .or(file.base_url)
                .unwrap_or(defaults.base_url),
            results_per_query: overrides
                .results_per_query
                .or(file.results_per_query)
                .unwrap_or(defaults.results_per_query),
            marker: overrides
                .marker
                .or(file.marker)
                .unwrap_or(defaults.marker),
            max_combinations: overrides
                .max_combinations
                .or(file.max_combinations)
                .unwrap_or(defaults.max_combinations),
            max_query_len: file.max_query_len.unwrap_or(defaults.max_query_len),
            page_size: file.page_size.unwrap_or(defaults.page_size),
            refresh_minutes: overrides
                .refresh_minutes
                .or(file.refresh_minutes)
                .unwrap_or(defaults.refresh_minutes),
            link_style: file.link_style.unwrap_or(defaults.link_style),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("results_per_query", self.results_per_query),
            ("max_combinations", self.max_combinations),
            ("max_query_len", self.max_query_len),
            ("page_size", self.page_size),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be positive")));
            }
        }
        if self.marker.is_whitespace() {
            return Err(Error::Config(
                "marker must not be a whitespace character".into(),
            ));
        }
        Ok(())
    }

    /// Where to load the inventory from: the configured file, or else the
    /// `objects.inv` published at `base_url`.
    pub fn inventory_source(&self) -> Result<Source> {
        if let Some(path) = &self.inventory {
            return Ok(Source::File(path.clone()));
        }
        if !self.base_url.is_empty() {
            return Ok(Source::published(&self.base_url));
        }
        Err(Error::Config(
            "no inventory configured; pass --inventory or --base-url, set \
             SPHINXBERT_INVENTORY or SPHINXBERT_BASE_URL, or add them to \
             config.toml"
                .into(),
        ))
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            results_per_query: self.results_per_query,
            marker: self.marker,
            max_query_len: self.max_query_len,
            max_combinations: self.max_combinations,
            page_size: self.page_size,
            link_style: self.link_style,
        }
    }
}
