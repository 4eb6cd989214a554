use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::projects::team::TeamMemberRef;
use crate::sources::content::ContentProject;
use crate::sources::relational::RelationalProject;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Snapshot tables hold raw source rows only; slugs are derived on read.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS relational_projects (
            id                  INTEGER PRIMARY KEY,
            title               TEXT,
            short_description   TEXT,
            long_description    TEXT,
            competition         TEXT,
            team_members_emails TEXT NOT NULL DEFAULT '[]',
            video_url           TEXT,
            image_url           TEXT,
            created_date        TEXT,
            synced_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS content_projects (
            entry_id     TEXT PRIMARY KEY,
            title        TEXT,
            tagline      TEXT,
            about        TEXT,
            competition  TEXT,
            image_url    TEXT,
            video_url    TEXT,
            team_members TEXT NOT NULL DEFAULT '[]',
            created_at   TEXT,
            synced_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sync_runs (
            id               INTEGER PRIMARY KEY,
            relational_ok    BOOLEAN NOT NULL,
            relational_count INTEGER NOT NULL,
            content_ok       BOOLEAN NOT NULL,
            content_count    INTEGER NOT NULL,
            finished_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

// ── Snapshots ──

pub fn replace_relational(conn: &Connection, rows: &[RelationalProject]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    tx.execute("DELETE FROM relational_projects", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO relational_projects
             (id, title, short_description, long_description, competition,
              team_members_emails, video_url, image_url, created_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for r in rows {
            count += stmt.execute(params![
                r.id,
                r.title,
                r.short_description,
                r.long_description,
                r.competition,
                serde_json::to_string(&r.team_members_emails)?,
                r.video_url,
                r.image_url,
                r.created_date,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn replace_content(conn: &Connection, rows: &[ContentProject]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    tx.execute("DELETE FROM content_projects", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO content_projects
             (entry_id, title, tagline, about, competition, image_url, video_url,
              team_members, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for c in rows {
            count += stmt.execute(params![
                c.entry_id,
                c.title,
                c.tagline,
                c.about,
                c.competition,
                c.image_url,
                c.video_url,
                serde_json::to_string(&c.team_members)?,
                c.created_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn load_relational(conn: &Connection) -> Result<Vec<RelationalProject>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, short_description, long_description, competition,
                team_members_emails, video_url, image_url, created_date
         FROM relational_projects
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let emails: String = row.get(5)?;
            Ok(RelationalProject {
                id: row.get(0)?,
                title: row.get(1)?,
                short_description: row.get(2)?,
                long_description: row.get(3)?,
                competition: row.get(4)?,
                team_members_emails: serde_json::from_str(&emails).unwrap_or_default(),
                video_url: row.get(6)?,
                image_url: row.get(7)?,
                created_date: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_content(conn: &Connection) -> Result<Vec<ContentProject>> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, title, tagline, about, competition, image_url, video_url,
                team_members, created_at
         FROM content_projects
         ORDER BY entry_id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let team: String = row.get(7)?;
            Ok(ContentProject {
                entry_id: row.get(0)?,
                title: row.get(1)?,
                tagline: row.get(2)?,
                about: row.get(3)?,
                competition: row.get(4)?,
                image_url: row.get(5)?,
                video_url: row.get(6)?,
                team_members: serde_json::from_str::<Vec<TeamMemberRef>>(&team)
                    .unwrap_or_default(),
                created_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Sync runs ──

pub struct SyncRun {
    pub relational_ok: bool,
    pub relational_count: usize,
    pub content_ok: bool,
    pub content_count: usize,
}

pub fn record_sync(conn: &Connection, run: &SyncRun) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_runs (relational_ok, relational_count, content_ok, content_count)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            run.relational_ok,
            run.relational_count as i64,
            run.content_ok,
            run.content_count as i64,
        ],
    )?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub relational: usize,
    pub content: usize,
    pub syncs: usize,
    pub last_sync: Option<String>,
    pub last_relational_ok: Option<bool>,
    pub last_content_ok: Option<bool>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let relational: usize =
        conn.query_row("SELECT COUNT(*) FROM relational_projects", [], |r| r.get(0))?;
    let content: usize =
        conn.query_row("SELECT COUNT(*) FROM content_projects", [], |r| r.get(0))?;
    let syncs: usize = conn.query_row("SELECT COUNT(*) FROM sync_runs", [], |r| r.get(0))?;
    let last = conn
        .query_row(
            "SELECT finished_at, relational_ok, content_ok FROM sync_runs
             ORDER BY id DESC LIMIT 1",
            [],
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, bool>(1)?, r.get::<_, bool>(2)?)),
        )
        .optional()?;
    Ok(Stats {
        relational,
        content,
        syncs,
        last_sync: last.as_ref().map(|l| l.0.clone()),
        last_relational_ok: last.as_ref().map(|l| l.1),
        last_content_ok: last.as_ref().map(|l| l.2),
    })
}
