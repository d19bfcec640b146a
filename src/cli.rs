use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "sphinxbert",
    about = "Fuzzy search over Sphinx documentation inventories"
)]
pub struct Cli {
    /// Path to the Sphinx objects.inv inventory
    #[arg(long, env = "SPHINXBERT_INVENTORY", global = true)]
    pub inventory: Option<PathBuf>,

    /// Root URL of the documentation, used to absolutize links
    #[arg(long, env = "SPHINXBERT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Read settings from this TOML file instead of the XDG config dir
    #[arg(long, env = "SPHINXBERT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Settings given on the command line, for layering over the config
    /// file.
    pub fn overrides(&self) -> Overrides {
        let (results_per_query, marker) = match &self.command {
            Command::Insert(args) => (args.results_per_query, args.marker),
            Command::Query(args) => (args.results_per_query, args.marker),
            _ => (None, None),
        };
        let refresh_minutes = match &self.command {
            Command::Mcp(args) => args.refresh_minutes,
            _ => None,
        };

        Overrides {
            inventory: self.inventory.clone(),
            base_url: self.base_url.clone(),
            results_per_query,
            marker,
            max_combinations: None,
            refresh_minutes,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a message like the inline bot: insert search when it
    /// contains marked queries, direct search otherwise
    Query(QueryArgs),
    /// Rank documentation entries against a query
    Search(SearchArgs),
    /// Replace every marked query in a message with documentation links
    Insert(InsertArgs),
    /// List the entries of the inventory
    List(ListArgs),
    /// Show project information about the loaded inventory
    Info(InfoArgs),
    /// Start MCP server for AI agent integration
    Mcp(McpArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Query --

#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// The message to answer
    pub message: String,

    /// Result page for direct searches (0-based)
    #[arg(long, default_value = "0")]
    pub page: usize,

    /// Matches kept per marked query
    #[arg(short = 'k', long)]
    pub results_per_query: Option<usize>,

    /// Character enclosing marked queries
    #[arg(short, long)]
    pub marker: Option<char>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Result page (0-based)
    #[arg(long, default_value = "0")]
    pub page: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Insert --

#[derive(Debug, Parser)]
pub struct InsertArgs {
    /// Message with queries enclosed in the marker, e.g. "see +Bot+"
    pub message: String,

    /// Matches kept per marked query
    #[arg(short = 'k', long)]
    pub results_per_query: Option<usize>,

    /// Character enclosing marked queries
    #[arg(short, long)]
    pub marker: Option<char>,

    /// Render links as Markdown instead of HTML
    #[arg(long)]
    pub markdown: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- List --

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only list entries whose domain matches this glob (e.g. "py:*")
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Output as JSON array
    #[arg(long)]
    pub json: bool,
}

// -- Info --

#[derive(Debug, Parser)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- MCP --

#[derive(Debug, Parser)]
pub struct McpArgs {
    /// Reload the inventory every N minutes (0 disables)
    #[arg(long, env = "SPHINXBERT_REFRESH_MINUTES")]
    pub refresh_minutes: Option<u64>,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "sphinxbert",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["sphinxbert", "search", "Bot"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "Bot");
                assert_eq!(args.count, None);
                assert_eq!(args.page, 0);
                assert!(!args.json);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn parse_insert_with_marker() {
        let cli = Cli::parse_from([
            "sphinxbert",
            "--inventory",
            "objects.inv",
            "insert",
            "see §Bot§",
            "-m",
            "§",
            "-k",
            "2",
            "--markdown",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.marker, Some('§'));
        assert_eq!(overrides.results_per_query, Some(2));
        assert_eq!(
            overrides.inventory.as_deref(),
            Some(std::path::Path::new("objects.inv"))
        );
        match cli.command {
            Command::Insert(args) => {
                assert_eq!(args.message, "see §Bot§");
                assert!(args.markdown);
            }
            _ => panic!("expected insert command"),
        }
    }

    #[test]
    fn parse_mcp_refresh() {
        let cli = Cli::parse_from(["sphinxbert", "mcp", "--refresh-minutes", "15"]);
        assert_eq!(cli.overrides().refresh_minutes, Some(15));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
