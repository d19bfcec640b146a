use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed inventory: {0}")]
    Inventory(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config file does not exist: {0}")]
    ConfigFile(PathBuf),

    #[error("query is {len} characters long, the limit is {limit}")]
    QueryTooLong { len: usize, limit: usize },

    #[error(
        "query would expand to {count} combinations, the limit is {limit}"
    )]
    TooManyCombinations { count: usize, limit: usize },
}
