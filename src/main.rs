mod config;
mod db;
mod error;
mod live;
mod projects;
mod search;
mod sources;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::info;

use config::Config;
use live::LiveSheet;
use projects::filter::{facet_options, filter_projects, record_year, FacetGroup, FilterState};
use projects::merge::{into_listing, merge};
use projects::slug::slugify;
use projects::ProjectRecord;
use sources::content::{self as content_source, ContentClient, ContentProject};
use sources::relational::{self as relational_source, RelationalClient, RelationalProject};
use sources::SourceFetch;

#[derive(Parser)]
#[command(name = "startup_hub", about = "Startup hub project directory and live event dashboard")]
struct Cli {
    /// SQLite snapshot path (overrides HUB_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both project sources and store a local snapshot
    Sync,
    /// Search the merged project directory
    Search {
        /// Case-insensitive title substring
        query: Option<String>,
        /// Competition facet (repeatable)
        #[arg(short, long)]
        competition: Vec<String>,
        /// Year facet (repeatable)
        #[arg(short, long)]
        year: Vec<String>,
        /// Query the sources directly instead of the snapshot
        #[arg(long)]
        live: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the competition and year facet values
    Facets,
    /// Show one project by slug or relational id
    Show { key: String },
    /// Projects a team member email belongs to
    Mine {
        #[arg(long)]
        email: String,
    },
    /// Look up a user by auth-provider id
    User {
        #[arg(long)]
        clerk_id: String,
    },
    /// Interactive search: one query per line on stdin
    Browse,
    /// Fetch and display the live event sheet
    Live {
        /// Fetch once and exit
        #[arg(long)]
        once: bool,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
        /// Poll interval in seconds (overrides HUB_POLL_SECS)
        #[arg(long)]
        interval: Option<u64>,
        /// Export URL (overrides HUB_LIVE_SHEET_URL)
        #[arg(long)]
        url: Option<String>,
    },
    /// Snapshot statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let result = match cli.command {
        Commands::Sync => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let (relational, content) = fetch_sources(&config).await?;

            // Keep the last good snapshot of a source that failed this round.
            if relational.ok {
                db::replace_relational(&conn, &relational.records)?;
            }
            if content.ok {
                db::replace_content(&conn, &content.records)?;
            }
            db::record_sync(
                &conn,
                &db::SyncRun {
                    relational_ok: relational.ok,
                    relational_count: relational.records.len(),
                    content_ok: content.ok,
                    content_count: content.records.len(),
                },
            )?;

            let merged = merge(&db::load_relational(&conn)?, &db::load_content(&conn)?);
            println!(
                "Relational: {} ({})",
                relational.records.len(),
                status_label(relational.ok)
            );
            println!("Content:    {} ({})", content.records.len(), status_label(content.ok));
            println!("Merged:     {} projects", merged.len());
            Ok(())
        }
        Commands::Search {
            query,
            competition,
            year,
            live,
            json,
        } => {
            let listing = if live {
                let (relational, content) = fetch_sources(&config).await?;
                into_listing(merge(&relational.records, &content.records))
            } else {
                snapshot_listing(&config)?
            };

            let mut filters = FilterState::new();
            for value in &competition {
                select(&mut filters, FacetGroup::Competition, value);
            }
            for value in &year {
                select(&mut filters, FacetGroup::Year, value);
            }

            let found = filter_projects(&listing, query.as_deref().unwrap_or(""), &filters);
            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                if !filters.is_empty() {
                    println!("Filters: {}", describe_filters(&filters));
                }
                print_projects(&found);
            }
            Ok(())
        }
        Commands::Facets => {
            let listing = snapshot_listing(&config)?;
            let options = facet_options(&listing);
            println!("{}:", FacetGroup::Competition);
            for c in &options.competitions {
                println!("  {}", c);
            }
            println!("{}:", FacetGroup::Year);
            for y in &options.years {
                println!("  {}", y);
            }
            Ok(())
        }
        Commands::Show { key } => {
            let listing = snapshot_listing(&config)?;
            let id = key.trim().parse::<i64>().ok();
            let found = find_project(&listing, &key);

            match (found, id) {
                (Some(project), _) => print_project(project),
                (None, Some(id)) => {
                    let client = RelationalClient::new(
                        sources::http_client(&config)?,
                        config.graphql_url.clone(),
                    );
                    match client.project(id).await? {
                        Some(row) => {
                            let content = content_snapshot(&config)?;
                            let merged = into_listing(merge(&[row], &content));
                            match merged.iter().find(|p| p.relational_id == Some(id)) {
                                Some(project) => print_project(project),
                                None => println!("Project {} has no usable title.", id),
                            }
                        }
                        None => println!("No project found for '{}'.", key),
                    }
                }
                (None, None) => println!("No project found for '{}'.", key),
            }
            Ok(())
        }
        Commands::Mine { email } => {
            let client =
                RelationalClient::new(sources::http_client(&config)?, config.graphql_url.clone());
            let mine = SourceFetch::from_result(
                relational_source::SOURCE,
                client.projects_by_email(email.trim()).await,
            );
            if !mine.ok {
                println!("Project service is unavailable; showing nothing for {}.", email);
                return Ok(());
            }
            let ids: Vec<i64> = mine.records.iter().map(|r| r.id).collect();
            let listing = into_listing(merge(&mine.records, &content_snapshot(&config)?));
            let own: Vec<&ProjectRecord> = listing
                .iter()
                .filter(|p| p.relational_id.is_some_and(|id| ids.contains(&id)))
                .collect();
            print_projects(&own);
            Ok(())
        }
        Commands::User { clerk_id } => {
            let client =
                RelationalClient::new(sources::http_client(&config)?, config.graphql_url.clone());
            match client.user_by_clerk_id(clerk_id.trim()).await? {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None => println!("No user with id {}.", clerk_id),
            }
            Ok(())
        }
        Commands::Browse => browse(&config).await,
        Commands::Live {
            once,
            json,
            interval,
            url,
        } => {
            let url = url.unwrap_or_else(|| config.live_sheet_url.clone());
            if url.trim().is_empty() {
                bail!("No live sheet URL: pass --url or set HUB_LIVE_SHEET_URL");
            }
            let client = sources::http_client(&config)?;

            if once {
                let text = live::poll::fetch_sheet(&client, &url).await?;
                show_sheet(&live::sheet::parse_sheet(&text), json)?;
                return Ok(());
            }

            let every = interval
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or(config.poll_interval);
            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = stop_tx.send(true);
                }
            });

            info!("Polling {} every {}s (Ctrl-C to stop)", url, every.as_secs());
            live::poll::poll_sheet(
                every,
                || live::poll::fetch_sheet(&client, &url),
                |sheet| {
                    if let Err(e) = show_sheet(&sheet, json) {
                        tracing::warn!("Failed to render live sheet: {}", e);
                    }
                },
                stop_rx,
            )
            .await;
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Relational rows: {}", s.relational);
            println!("Content entries: {}", s.content);
            println!("Syncs:           {}", s.syncs);
            if let Some(at) = &s.last_sync {
                println!(
                    "Last sync:       {} (relational {}, content {})",
                    at,
                    status_label(s.last_relational_ok.unwrap_or(false)),
                    status_label(s.last_content_ok.unwrap_or(false)),
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Fetch both sources concurrently; a failing source comes back empty.
async fn fetch_sources(
    config: &Config,
) -> Result<(SourceFetch<RelationalProject>, SourceFetch<ContentProject>)> {
    let http = sources::http_client(config)?;
    let relational = RelationalClient::new(http.clone(), config.graphql_url.clone());
    let content = ContentClient::from_config(http, config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Fetching projects...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let (rel, cms) = tokio::join!(relational.projects(), content.projects());
    pb.finish_and_clear();

    Ok((
        SourceFetch::from_result(relational_source::SOURCE, rel),
        SourceFetch::from_result(content_source::SOURCE, cms),
    ))
}

fn snapshot_listing(config: &Config) -> Result<Vec<ProjectRecord>> {
    let conn = db::connect(&config.db_path)?;
    db::init_schema(&conn)?;
    let merged = merge(&db::load_relational(&conn)?, &db::load_content(&conn)?);
    Ok(into_listing(merged))
}

fn content_snapshot(config: &Config) -> Result<Vec<ContentProject>> {
    let conn = db::connect(&config.db_path)?;
    db::init_schema(&conn)?;
    db::load_content(&conn)
}

/// Look a project up by title or slug, falling back to its relational id.
fn find_project<'a>(listing: &'a [ProjectRecord], key: &str) -> Option<&'a ProjectRecord> {
    let slug = slugify(key);
    let id = key.trim().parse::<i64>().ok();
    listing
        .iter()
        .find(|p| !slug.is_empty() && p.slug == slug)
        .or_else(|| id.and_then(|id| listing.iter().find(|p| p.relational_id == Some(id))))
}

fn select(filters: &mut FilterState, group: FacetGroup, value: &str) {
    if !filters.is_selected(group, value) {
        filters.toggle(group, value);
    }
}

fn describe_filters(filters: &FilterState) -> String {
    [FacetGroup::Competition, FacetGroup::Year]
        .into_iter()
        .filter_map(|group| {
            let values: Vec<&str> = filters.values(group).collect();
            (!values.is_empty()).then(|| format!("{}={}", group, values.join("|")))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

async fn browse(config: &Config) -> Result<()> {
    let listing = snapshot_listing(config)?;
    println!(
        "{} projects loaded. Type to search; Ctrl-D to quit.",
        listing.len()
    );

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut queries = search::spawn_debouncer(rx, config.search_debounce);
    let filters = FilterState::new();
    while let Some(query) = queries.recv().await {
        let found = filter_projects(&listing, &query, &filters);
        println!("\n> {}", query.trim());
        print_projects(&found);
    }
    Ok(())
}

fn print_projects(found: &[&ProjectRecord]) {
    if found.is_empty() {
        println!("No projects found.");
        return;
    }

    println!(
        "{:>3} | {:<28} | {:<18} | {:>4} | {:<10} | {:<32}",
        "#", "Project", "Competition", "Year", "Source", "Tagline"
    );
    println!("{}", "-".repeat(110));
    for (i, p) in found.iter().enumerate() {
        println!(
            "{:>3} | {:<28} | {:<18} | {:>4} | {:<10} | {:<32}",
            i + 1,
            truncate(&p.title, 28),
            truncate(p.competition.as_deref().unwrap_or("-"), 18),
            record_year(p),
            p.provenance.as_str(),
            truncate(p.short_description.as_deref().unwrap_or(""), 32),
        );
    }
    println!("\n{} projects | slug: /projects/<slug>", found.len());
}

fn print_project(p: &ProjectRecord) {
    println!("{}", p.title);
    println!("  slug:        {}", p.slug);
    println!("  source:      {}", p.provenance.as_str());
    if let Some(id) = p.relational_id {
        println!("  id:          {}", id);
    }
    let optional = [
        ("tagline", &p.short_description),
        ("competition", &p.competition),
        ("image", &p.image_url),
        ("video", &p.video_url),
        ("created", &p.created_at),
    ];
    for (label, value) in optional {
        if let Some(v) = value {
            println!("  {:<12} {}", format!("{}:", label), v);
        }
    }
    println!("  {:<12} {}", "year:", record_year(p));
    if !p.team_members.is_empty() {
        let team: Vec<&str> = p.team_members.iter().map(|m| m.label()).collect();
        println!("  {:<12} {}", "team:", team.join(", "));
    }
    for (label, text) in [("About", &p.about), ("Description", &p.long_description)] {
        if let Some(text) = text {
            println!("\n{}\n{}", label, text);
        }
    }
}

fn show_sheet(sheet: &LiveSheet, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(sheet)?);
        return Ok(());
    }
    if sheet.is_empty() {
        println!("Live sheet has no groups, coordinators or judges yet.");
        return Ok(());
    }

    println!("\n--- Groups ({}) ---", sheet.groups.len());
    for g in &sheet.groups {
        println!(
            "  {:<12} {:<24} room {:<10} hub {:<12} judge {} ({}) [{}]",
            truncate(&g.name, 12),
            truncate(&g.project, 24),
            g.breakout_room,
            g.hub_name,
            g.judge,
            g.judge_room,
            g.color
        );
        if !g.members.is_empty() {
            println!("  {:<12} {}", "", g.members.join(", "));
        }
    }

    println!("\n--- Coordinators ({}) ---", sheet.coordinators.len());
    for c in &sheet.coordinators {
        let meetings: Vec<String> = c
            .meetings
            .iter()
            .map(|m| format!("{} @ {}", m.place, m.times))
            .collect();
        println!("  {:<16} {}", truncate(&c.name, 16), meetings.join("; "));
    }

    println!("\n--- Judges ({}) ---", sheet.judges.len());
    for j in &sheet.judges {
        println!("  {:<20} {:<12} {}", truncate(&j.name, 20), j.room, j.time);
    }
    Ok(())
}

fn status_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "unavailable"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<ProjectRecord> {
        let rel = [
            RelationalProject {
                id: 1,
                title: Some("Acme Bot".into()),
                ..Default::default()
            },
            RelationalProject {
                id: 2024,
                title: Some("Beta App".into()),
                ..Default::default()
            },
        ];
        into_listing(merge(&rel, &[]))
    }

    #[test]
    fn show_key_accepts_title_or_slug() {
        let listing = listing();
        for key in ["acme-bot", "Acme Bot", "  ACME   bot "] {
            let found = find_project(&listing, key).map(|p| p.slug.as_str());
            assert_eq!(found, Some("acme-bot"), "{key:?}");
        }
    }

    #[test]
    fn show_key_falls_back_to_relational_id() {
        let listing = listing();
        assert_eq!(find_project(&listing, "2024").map(|p| p.title.as_str()), Some("Beta App"));
        assert_eq!(find_project(&listing, "1").map(|p| p.title.as_str()), Some("Acme Bot"));
        assert!(find_project(&listing, "Gamma").is_none());
        assert!(find_project(&listing, "!!!").is_none());
    }
}
