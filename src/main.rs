use anyhow::{Context, Result};
use chromium_runner::commands::{config, search, Config};
use chromium_runner::services::runner::SYNTAXES;
use chromium_runner::{Candidate, Runner, SystemLauncher};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Match keyword searches and bookmarks from a Chromium profile
#[derive(Parser, Debug)]
#[command(name = "chromium-runner", version, about)]
struct Cli {
    /// Query to match; queries are read from stdin when omitted
    query: Vec<String>,

    /// Home directory containing .config/chromium
    #[arg(long)]
    home: Option<PathBuf>,

    /// Profile directory name
    #[arg(long)]
    profile: Option<String>,

    /// Path of the keyword database
    #[arg(long)]
    web_data: Option<PathBuf>,

    /// Path of the Local State file
    #[arg(long)]
    local_state: Option<PathBuf>,

    /// Path of the Bookmarks file
    #[arg(long)]
    bookmarks: Option<PathBuf>,

    /// Do not watch the profile files while reading queries from stdin
    #[arg(long)]
    no_watch: bool,

    /// Print candidates as JSON
    #[arg(long)]
    json: bool,

    /// Maximum number of candidates to print
    #[arg(long)]
    limit: Option<usize>,

    /// Open the N-th candidate (1 based) in the browser
    #[arg(long, value_name = "N")]
    open: Option<usize>,

    /// Write the effective configuration to the config file
    #[arg(long)]
    save_config: bool,

    /// Print the supported query syntaxes and exit
    #[arg(long)]
    syntaxes: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(home) = &self.home {
            config.home = Some(home.clone());
        }
        if let Some(profile) = &self.profile {
            config.profile = profile.clone();
        }
        if let Some(path) = &self.web_data {
            config.web_data = Some(path.clone());
        }
        if let Some(path) = &self.local_state {
            config.local_state = Some(path.clone());
        }
        if let Some(path) = &self.bookmarks {
            config.bookmarks = Some(path.clone());
        }
        if self.no_watch {
            config.watch = false;
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chromium_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.syntaxes {
        for syntax in SYNTAXES.iter() {
            println!("{}\t{}", syntax.example, syntax.description);
        }
        return Ok(());
    }

    let config = cli.apply(config::get_config()?);
    if cli.save_config {
        config::set_config(config.clone()).context("Failed to save configuration")?;
    }

    let paths = config
        .source_paths()
        .context("Failed to resolve Chromium profile paths")?;

    if !cli.query.is_empty() {
        let runner = Runner::start(paths, None, Box::new(SystemLauncher))?;
        let query = cli.query.join(" ");
        let results = search::search(&runner, &query, cli.limit);
        print_results(&results, cli.json)?;
        if let Some(n) = cli.open {
            search::open_result(&runner, &results, n)?;
        }
        return Ok(());
    }

    let mut runner = Runner::start(paths, config.debounce(), Box::new(SystemLauncher))
        .context("Failed to start runner")?;
    let mut last_results = Vec::new();

    for line in io::stdin().lock().lines() {
        let line = line?;
        // ":open N" runs a candidate from the previous query
        if let Some(n) = line.trim().strip_prefix(":open ") {
            match n.trim().parse::<usize>() {
                Ok(n) => {
                    if let Err(e) = search::open_result(&runner, &last_results, n) {
                        eprintln!("{}", e);
                    }
                }
                Err(_) => eprintln!("Usage: :open N"),
            }
            continue;
        }
        last_results = search::search(&runner, &line, cli.limit);
        print_results(&last_results, cli.json)?;
    }

    runner.stop();
    Ok(())
}

fn print_results(results: &[Candidate], json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer(&mut out, results)?;
        writeln!(out)?;
    } else {
        for (i, candidate) in results.iter().enumerate() {
            let text = candidate.display_text().replace('\n', "  ");
            writeln!(out, "{:>3}. {}", i + 1, text)?;
        }
    }
    out.flush()?;
    Ok(())
}
