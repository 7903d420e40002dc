use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber;
use url::Url;

use backfile_core::archive::{self, Agent, ArchiveLayout};
use backfile_core::data::Database;
use backfile_core::report::{self, ReportFormat};
use backfile_core::seeds::{self, DateStyle};
use backfile_fetch::{HttpFetcher, page};

// Helper functions for the crawl handler

/// Archive layout for a --dir argument, with ~ expanded.
pub fn layout_from_arg(dir: &str) -> ArchiveLayout {
    let expanded = shellexpand::tilde(dir);
    ArchiveLayout::new(Path::new(expanded.as_ref()))
}

/// Seed urls for a crawl: either a newline-delimited file, or a dated
/// schema expanded from --from back to --until.
pub fn load_seeds_from_source(
    schema: Option<&String>,
    from: &str,
    until: Option<&String>,
    style: DateStyle,
    seeds_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(path) = seeds_file {
        return load_seeds_from_file(path);
    }

    let Some(schema) = schema else {
        return Err("Either --schema or --seeds-file must be provided".to_string());
    };
    let Some(until) = until else {
        return Err("--until <DATE> is required with --schema".to_string());
    };

    seeds::archive_urls(schema, from, until, style).map_err(|e| e.to_string())
}

/// Load and parse seed urls from a file
pub fn load_seeds_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read seeds file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_seed_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid urls found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a url, trying to add http:// if needed
pub fn parse_seed_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid url '{}'", line);
    None
}

fn display_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_lowercase()
}

/// Opens an archive that must already exist; exits with a hint otherwise.
fn open_existing(dir: &str, timeout: u64) -> Agent {
    let layout = layout_from_arg(dir);
    if !Database::exists(&layout.db_path()) {
        eprintln!("✗ No archive database at {}", layout.db_path().display());
        eprintln!("  Run 'backfile init' or 'backfile crawl' first.");
        std::process::exit(1);
    }

    match Agent::open(layout, Box::new(HttpFetcher::with_timeout(timeout))) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("✗ Failed to open archive: {}", e);
            std::process::exit(1);
        }
    }
}

/// Fetches each url through the cache behind a progress bar. Returns
/// (newly fetched, cache hits, failures).
fn fetch_with_progress(agent: &Agent, urls: &[String]) -> (usize, usize, Vec<(String, String)>) {
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap(),
    );

    let mut fetched = 0usize;
    let mut cached = 0usize;
    let mut failures: Vec<(String, String)> = Vec::new();

    for url in urls {
        pb.set_message(display_path(url));
        let outcome = agent.fetch_page(url);
        if let Some(error) = outcome.error {
            failures.push((outcome.url, error));
        } else if outcome.from_cache {
            cached += 1;
        } else {
            fetched += 1;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    (fetched, cached, failures)
}

fn print_fetch_summary(fetched: usize, cached: usize, failures: &[(String, String)]) {
    println!(
        "{} Fetch pass complete: {} fetched, {} already cached, {} failed",
        "✓".green().bold(),
        fetched.to_string().cyan(),
        cached.to_string().cyan(),
        failures.len().to_string().cyan()
    );
    for (url, error) in failures {
        println!("  {} {} ({})", "✗".red(), url, error);
    }
}

fn run_extract(agent: &Agent) {
    match agent.extract_text() {
        Ok(summary) => {
            println!(
                "{} Text extraction complete: {} written, {} already present, {} not fetched, {} failed",
                "✓".green().bold(),
                summary.written.to_string().cyan(),
                summary.skipped,
                summary.missing,
                summary.failed
            );
        }
        Err(e) => {
            eprintln!("✗ Text extraction failed: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn handle_init(args: &ArgMatches) {
    print_divider();
    println!("{}", "  BACKFILE INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let path_arg = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let layout = layout_from_arg(path_arg);
    let db_path = layout.db_path();

    println!("{} Parsed arguments", "✓".green().bold());
    println!(
        "{} Target: {}",
        "→".blue(),
        layout.root.display().to_string().bright_white()
    );
    println!();

    // Handle existing database in force mode
    if force && Database::exists(&db_path) {
        println!(
            "{} Deleting existing database (force mode)",
            "→".yellow().bold()
        );
        if let Err(e) = Database::drop(&db_path) {
            eprintln!("✗ Failed to remove existing database: {}", e);
            std::process::exit(1);
        }
        println!("{} Existing database removed", "✓".green().bold());
        println!();
    }

    if Database::exists(&db_path) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Database already exists at:");
        println!(
            "  {} {}",
            "•".yellow(),
            db_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Would you like to overwrite it? [y/N]:");
        println!();

        if response != "y" && response != "yes" {
            println!("{} Keeping existing database", "→".blue());
            return;
        }
        if let Err(e) = Database::drop(&db_path) {
            eprintln!("✗ Failed to remove existing database: {}", e);
            std::process::exit(1);
        }
        println!("{} Existing database removed", "✓".green().bold());
        println!();
    }

    println!("{} Creating directory structure...", "→".blue());
    for dir in [layout.root.clone(), layout.pages_dir(), layout.text_dir()] {
        if let Err(e) = fs::create_dir_all(&dir) {
            eprintln!("✗ Failed to create {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        println!(
            "  {} {}",
            "✓".green(),
            dir.display().to_string().bright_white()
        );
    }

    println!("{} Creating database...", "→".blue());
    match Database::new(&db_path) {
        Ok(_) => {
            println!(
                "{} Database initialized: {}",
                "✓".green().bold(),
                db_path.display().to_string().bright_white()
            );
        }
        Err(e) => {
            eprintln!("✗ Failed to create database: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
}

pub fn handle_crawl(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let dir = sub_matches.get_one::<String>("dir").unwrap();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&30);
    let within = sub_matches.get_one::<String>("within");
    let no_scan = sub_matches.get_flag("no-scan");

    if let Some(css) = within
        && !page::is_valid_selector(css)
    {
        eprintln!("✗ Invalid --within selector '{}'", css);
        std::process::exit(1);
    }

    let style = sub_matches
        .get_one::<String>("date-format")
        .and_then(|s| DateStyle::from_str(s))
        .unwrap_or(DateStyle::Compact);

    // Build the seed list before touching the archive
    let seeds = match load_seeds_from_source(
        sub_matches.get_one::<String>("schema"),
        sub_matches.get_one::<String>("from").unwrap(),
        sub_matches.get_one::<String>("until"),
        style,
        sub_matches.get_one::<PathBuf>("seeds-file"),
    ) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let layout = layout_from_arg(dir);

    // Print crawl configuration
    println!("\nCrawling {} archive page(s)", seeds.len());
    println!("Archive: {}", layout.root.display());
    let scan_str = if no_scan {
        "disabled (fetch only)".to_string()
    } else {
        match within {
            Some(css) => format!("links within '{}'", css),
            None => "all links".to_string(),
        }
    };
    println!("Scan: {}\n", scan_str);

    let agent = match Agent::open(layout, Box::new(HttpFetcher::with_timeout(timeout))) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("✗ Failed to open archive: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = agent.seed_all(&seeds) {
        eprintln!("✗ Seeding failed: {}", e);
        std::process::exit(1);
    }

    let (fetched, cached, failures) = fetch_with_progress(&agent, &seeds);
    print_fetch_summary(fetched, cached, &failures);

    if no_scan {
        return;
    }

    let scope = within.map(|s| s.as_str());
    let outcomes = agent.scan_all(&seeds, scope);

    let recorded = outcomes
        .iter()
        .filter(|o| o.error.is_none() && !o.skipped)
        .count();
    let links: usize = outcomes.iter().map(|o| o.links).sum();
    let skipped = outcomes.iter().filter(|o| o.skipped).count();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    println!(
        "{} Scan pass complete: {} pages scanned, {} links recorded, {} already scanned, {} failed",
        "✓".green().bold(),
        recorded.to_string().cyan(),
        links.to_string().cyan(),
        skipped,
        failed
    );
    for outcome in outcomes.iter().filter(|o| o.error.is_some()) {
        println!(
            "  {} {} ({})",
            "✗".red(),
            outcome.url,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

pub fn handle_articles(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let dir = sub_matches.get_one::<String>("dir").unwrap();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&30);
    let with_text = sub_matches.get_flag("with-text");

    let agent = open_existing(dir, timeout);

    let articles = match agent.article_urls() {
        Ok(articles) => articles,
        Err(e) => {
            eprintln!("✗ Failed to derive article urls: {}", e);
            std::process::exit(1);
        }
    };

    if articles.is_empty() {
        println!("No article links recorded yet. Run 'backfile crawl' first.");
        return;
    }

    println!("\nFetching {} linked article(s)", articles.len());
    let (fetched, cached, failures) = fetch_with_progress(&agent, &articles);
    print_fetch_summary(fetched, cached, &failures);

    if with_text {
        run_extract(&agent);
    }
}

pub fn handle_extract(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let dir = sub_matches.get_one::<String>("dir").unwrap();
    let agent = open_existing(dir, 30);
    run_extract(&agent);
}

pub fn handle_report(args: &ArgMatches) {
    let dir = args.get_one::<String>("dir").unwrap();
    let filter = args.get_one::<String>("filter").map(|s| s.as_str());
    let format = args
        .get_one::<String>("format")
        .and_then(|s| ReportFormat::from_str(s))
        .unwrap_or(ReportFormat::Text);
    let output = args.get_one::<PathBuf>("output");

    let layout = layout_from_arg(dir);
    if !Database::exists(&layout.db_path()) {
        eprintln!("✗ No archive database at {}", layout.db_path().display());
        std::process::exit(1);
    }

    let db = match Database::new(&layout.db_path()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("✗ Failed to open archive database: {}", e);
            std::process::exit(1);
        }
    };

    let data = match report::gather_link_counts(&db, filter) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("✗ Failed to gather report data: {}", e);
            std::process::exit(1);
        }
    };

    let content = match format {
        ReportFormat::Text => report::generate_text_report(&data),
        ReportFormat::Json => match report::generate_json_report(&data) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("✗ Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        },
    };

    match output {
        Some(path) => {
            if let Err(e) = report::save_report(&content, path) {
                eprintln!("✗ Failed to save report to {}: {}", path.display(), e);
                std::process::exit(1);
            }
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", content),
    }
}

pub fn handle_clean(args: &ArgMatches) {
    let dir = args.get_one::<String>("dir").unwrap();
    let force = args.get_flag("force");
    let layout = layout_from_arg(dir);

    let targets: Vec<PathBuf> = [layout.db_path(), layout.pages_dir(), layout.text_dir()]
        .into_iter()
        .filter(|p| p.exists())
        .collect();

    if targets.is_empty() {
        println!("Nothing to clean at {}", layout.root.display());
        return;
    }

    println!("{}", "⚠ WARNING".yellow().bold());
    println!("This will permanently remove:");
    for target in &targets {
        println!(
            "  {} {}",
            "•".yellow(),
            target.display().to_string().bright_white()
        );
    }
    println!();

    if !force {
        let response = print_prompt("Do you want to continue? [y/N]:");
        println!();

        if response != "y" && response != "yes" {
            println!("{} Clean cancelled.", "✗".red().bold());
            return;
        }
    }

    match archive::clean_archive(&layout) {
        Ok(()) => {
            println!(
                "{} Archive cleaned. The next crawl starts a fresh store.",
                "✓".green().bold()
            );
        }
        Err(e) => {
            eprintln!("✗ Clean failed: {}", e);
            std::process::exit(1);
        }
    }
}
