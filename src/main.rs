//! Football fixtures feature CLI
//!
//! Scrapes team match logs and writes a fixtures table with pre-match
//! features for both sides.

use clap::{Parser, Subcommand};
use football::{Config, Result};

#[derive(Parser)]
#[command(name = "football")]
#[command(about = "Scrape match logs and build pre-match fixture features", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "football.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured team and write the fixtures CSV
    Sync {
        /// Cache directory for HTML files
        #[arg(long)]
        cache: Option<String>,
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
        /// Override the output CSV path
        #[arg(long)]
        output: Option<String>,
    },
    /// List the configured teams
    Teams,
    /// Initialize a new project with default config
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Sync {
            cache,
            offline,
            output,
        } => commands::sync(&config, cache, offline, output),
        Commands::Teams => commands::teams(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use football::data::scrapers::fbref::FbrefScraper;
    use football::data::scrapers::RetryPolicy;
    use football::data::write_fixtures_csv;
    use football::features::NormalizeConfig;
    use football::pipeline;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to choose teams and competition", config_path);
        println!("  2. Run 'football sync' to fetch match logs and build features");

        Ok(())
    }

    pub fn sync(
        config: &Config,
        cache: Option<String>,
        offline: bool,
        output: Option<String>,
    ) -> Result<()> {
        let mut scraper = FbrefScraper::new(&config.scrape)?;

        if let Some(cache_dir) = cache {
            println!("Using cache directory: {}", cache_dir);
            scraper = scraper.with_cache(&cache_dir);
        }

        if offline {
            println!("Offline mode: using cached files only");
            scraper = scraper.offline_only(true);
        }

        println!(
            "Collecting {} teams ({})...",
            config.teams.len(),
            config.pipeline.competition
        );
        let report = pipeline::collect_teams(
            &scraper,
            &config.teams,
            &RetryPolicy::from(&config.retry),
            &NormalizeConfig::from(config),
        );
        println!(
            "Collected {}/{} teams, {} matches",
            report.collected.len(),
            report.teams_attempted(),
            report.records.len()
        );
        for (team, err) in &report.failures {
            println!("  skipped {}: {}", team, err);
        }

        let fixtures = pipeline::build_fixtures(&report)?;
        let path = output.unwrap_or_else(|| config.data.output_path.clone());
        write_fixtures_csv(&path, &fixtures)?;
        println!("CSV saved at {} ({} fixture rows)", path, fixtures.len());

        Ok(())
    }

    pub fn teams(config: &Config) -> Result<()> {
        println!("Configured teams ({})", config.pipeline.competition);
        println!("───────────────────────────────");
        for team in &config.teams {
            println!("  {:<20} {}", team.name, team.url);
        }
        if !config.aliases.is_empty() {
            println!("\nOpponent aliases");
            for (label, name) in &config.aliases {
                println!("  {:<20} -> {}", label, name);
            }
        }
        Ok(())
    }
}
