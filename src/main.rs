use clap::Parser;
use sphinxbert::{
    EntryIndex,
    cli::{self, Cli, Command},
    config::{Config, ConfigFile},
    error::{self, Error},
    expand::LinkStyle,
    inventory,
    mcp,
    search,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SPHINXBERT_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let file = ConfigFile::discover(cli.config.as_deref())?;
    let config = Config::resolve(&cli.overrides(), file)?;

    if let Command::Mcp(_) = cli.command {
        return mcp::run_mcp(config);
    }

    let index = load_index(&config)?;

    match cli.command {
        Command::Query(args) => cmd_query(&index, &config, &args)?,
        Command::Search(args) => cmd_search(&index, &config, &args)?,
        Command::Insert(args) => cmd_insert(&index, &config, &args)?,
        Command::List(args) => cmd_list(&index, &args)?,
        Command::Info(args) => cmd_info(&index, args.json)?,
        Command::Mcp(_) | Command::Completions(_) => {}
    }

    Ok(())
}

fn load_index(config: &Config) -> error::Result<EntryIndex> {
    match config.inventory_source()? {
        inventory::Source::File(path) => {
            inventory::load(&path, &config.base_url)
        }
        inventory::Source::Url(url) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let client = inventory::http_client()?;
            runtime.block_on(inventory::fetch(&client, &url, &config.base_url))
        }
    }
}

fn cmd_query(
    index: &EntryIndex,
    config: &Config,
    args: &cli::QueryArgs,
) -> error::Result<()> {
    let options = config.search_options();
    let response = search::handle(index, &args.message, args.page, &options)?;

    if args.json {
        return search::format_json(&response);
    }
    match response {
        search::Response::Direct(page) => search::format_human_direct(&page),
        search::Response::Insert { results } => {
            search::format_human_insert(&results)
        }
    }
    Ok(())
}

fn cmd_search(
    index: &EntryIndex,
    config: &Config,
    args: &cli::SearchArgs,
) -> error::Result<()> {
    let mut options = config.search_options();
    if let Some(count) = args.count {
        if count == 0 {
            return Err(Error::InvalidArgument(
                "--count must be positive".into(),
            ));
        }
        options.page_size = count;
    }

    let page = search::direct_search(index, &args.query, args.page, &options)?;
    if args.json {
        search::format_json(&page)
    } else {
        search::format_human_direct(&page);
        Ok(())
    }
}

fn cmd_insert(
    index: &EntryIndex,
    config: &Config,
    args: &cli::InsertArgs,
) -> error::Result<()> {
    let mut options = config.search_options();
    if args.markdown {
        options.link_style = LinkStyle::Markdown;
    }

    let hits = search::insert_search(index, &args.message, &options)?;
    if args.json {
        search::format_json(&hits)
    } else {
        search::format_human_insert(&hits);
        Ok(())
    }
}

fn cmd_list(index: &EntryIndex, args: &cli::ListArgs) -> error::Result<()> {
    let matcher = args
        .domain
        .as_deref()
        .map(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher())
                .map_err(|e| {
                    Error::InvalidArgument(format!(
                        "invalid domain pattern: {e}"
                    ))
                })
        })
        .transpose()?;

    let entries: Vec<_> = index
        .entries()
        .iter()
        .filter(|entry| {
            matcher
                .as_ref()
                .is_none_or(|glob| glob.is_match(&entry.domain))
        })
        .collect();

    if args.json {
        return search::format_json(&entries);
    }

    if entries.is_empty() {
        println!("No entries.");
    } else {
        for entry in &entries {
            println!("{}\t{}\t{}", entry.name, entry.domain, entry.link);
        }
        println!("\n{} entries", entries.len());
    }
    Ok(())
}

fn cmd_info(index: &EntryIndex, json: bool) -> error::Result<()> {
    let info = search::info(index);

    if json {
        return search::format_json(&info);
    }

    println!("Project: {}", info.project);
    println!("Version: {}", info.version);
    println!("Documentation: {}", info.base_url);
    println!("Entries: {}", info.entries);
    for (domain, count) in &info.domains {
        println!("  {domain}: {count}");
    }
    Ok(())
}
