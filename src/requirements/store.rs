//! 要求レコードの永続化ストア
//!
//! SQLite でメタデータとリストフィールド（JSON カラム）を管理する。
//! このコアが使用する操作は追加と取得のみで、更新・削除は公開しない。

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;

use super::{Priority, Requirement, Status};

/// 要求レコードを永続化するストア。
/// `Connection` を Mutex で包み、セッション間で共有できるようにする。
pub struct RequirementStore {
    conn: Mutex<Connection>,
}

impl RequirementStore {
    /// データディレクトリを決定し、DB を初期化する。
    pub fn open() -> Result<Self> {
        let data_dir = Self::data_dir()?;
        Self::open_at(data_dir)
    }

    /// 指定されたディレクトリで ストアを初期化する（テスト用にも使用）。
    pub fn open_at(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir).with_context(|| {
            format!("failed to create data directory: {}", data_dir.display())
        })?;

        let db_path = data_dir.join("requirements.db");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database: {}", db_path.display()))?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 要求を 1 件追加する。
    /// `id` は PRIMARY KEY のため、採番の競合は INSERT エラーとして顕在化する。
    pub fn add(&self, req: &Requirement) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO requirements (
                id, req_type, title, description, priority, status,
                category, rationale, dependencies, refines, tags,
                author, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            rusqlite::params![
                req.id,
                req.rtype,
                req.title,
                req.description,
                req.priority.as_str(),
                req.status.as_str(),
                req.category,
                req.rationale,
                serde_json::to_string(&req.dependencies)?,
                serde_json::to_string(&req.refines)?,
                serde_json::to_string(&req.tags)?,
                req.author,
                req.created_at.to_rfc3339(),
                req.updated_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("failed to insert requirement {}", req.id))?;

        Ok(())
    }

    /// 全要求を作成順（rowid 順）で取得する。
    pub fn get_all(&self) -> Result<Vec<Requirement>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, req_type, title, description, priority, status,
                    category, rationale, dependencies, refines, tags,
                    author, created_at, updated_at
             FROM requirements ORDER BY rowid",
        )?;

        let rows = stmt.query_map([], Self::row_to_requirement)?;
        let mut requirements = Vec::new();
        for row in rows {
            requirements.push(row.context("failed to read requirement row")??);
        }
        Ok(requirements)
    }

    /// ID を指定して要求を 1 件取得する。存在しなければ None。
    pub fn get(&self, id: &str) -> Result<Option<Requirement>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, req_type, title, description, priority, status,
                    category, rationale, dependencies, refines, tags,
                    author, created_at, updated_at
             FROM requirements WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map([id], Self::row_to_requirement)?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read requirement row")??)),
            None => Ok(None),
        }
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("requirement store lock poisoned"))
    }

    /// 行を `Requirement` に変換する。
    /// enum カラムや JSON カラムのパース失敗は内側の Result で返す
    /// （rusqlite の行エラーと区別するため二重 Result になる）。
    fn row_to_requirement(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Requirement>> {
        let priority_raw: String = row.get(4)?;
        let status_raw: String = row.get(5)?;
        let dependencies_raw: String = row.get(8)?;
        let refines_raw: String = row.get(9)?;
        let tags_raw: String = row.get(10)?;
        let created_raw: String = row.get(12)?;
        let updated_raw: String = row.get(13)?;

        let parsed = (|| -> Result<Requirement> {
            Ok(Requirement {
                id: row.get(0)?,
                rtype: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                priority: Priority::parse(&priority_raw)
                    .ok_or_else(|| anyhow!("unknown priority: {priority_raw}"))?,
                status: Status::parse(&status_raw)
                    .ok_or_else(|| anyhow!("unknown status: {status_raw}"))?,
                category: row.get(6)?,
                rationale: row.get(7)?,
                dependencies: serde_json::from_str(&dependencies_raw)?,
                refines: serde_json::from_str(&refines_raw)?,
                tags: serde_json::from_str(&tags_raw)?,
                author: row.get(11)?,
                created_at: parse_timestamp(&created_raw)?,
                updated_at: parse_timestamp(&updated_raw)?,
            })
        })();

        Ok(parsed)
    }

    /// データディレクトリのパスを返す。
    /// `directories` クレートを使用してプラットフォームに応じたパスを決定する。
    fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "reqchat").context("failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// DB スキーマのマイグレーションを実行する。
    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS requirements (
                id           TEXT PRIMARY KEY,
                req_type     TEXT NOT NULL,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                priority     TEXT NOT NULL,
                status       TEXT NOT NULL,
                category     TEXT NOT NULL DEFAULT '',
                rationale    TEXT NOT NULL DEFAULT '',
                dependencies TEXT NOT NULL DEFAULT '[]',
                refines      TEXT NOT NULL DEFAULT '[]',
                tags         TEXT NOT NULL DEFAULT '[]',
                author       TEXT NOT NULL DEFAULT '',
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );",
        )
        .context("failed to create requirements table")?;

        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp: {raw}"))
}
