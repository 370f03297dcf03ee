//! SQLite-based task store.
//!
//! Provides persistent storage for:
//! - Tasks and their completion metadata
//! - The singleton user stats aggregate
//! - Unlocked achievements
//! - Key-value store for application state (e.g. the saved focus session)
//!
//! Timestamps are stored as RFC3339 TEXT columns.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, DatabaseError, Result};
use crate::stats::{level_for_xp, UserStats};
use crate::task::{NewTask, Priority, Task, TaskCounts, TaskFilter, TaskPatch, TaskStatus};

use super::data_dir;

/// SQLite database for tasks, user stats, and achievements.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/taskflow/taskflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("taskflow.db"))
    }

    /// Open the database at an explicit path.
    ///
    /// Multiple handles on the same file are valid; SQLite's own locking
    /// serializes their transactions.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id                TEXT PRIMARY KEY,
                    title             TEXT NOT NULL,
                    description       TEXT,
                    status            TEXT NOT NULL DEFAULT 'todo'
                        CHECK(status IN ('todo', 'in-progress', 'done')),
                    priority          TEXT NOT NULL DEFAULT 'medium'
                        CHECK(priority IN ('low', 'medium', 'high')),
                    category          TEXT,
                    estimated_minutes INTEGER,
                    actual_minutes    INTEGER NOT NULL DEFAULT 0,
                    pomodoro_count    INTEGER NOT NULL DEFAULT 0,
                    due_date          TEXT,
                    created_at        TEXT NOT NULL,
                    updated_at        TEXT NOT NULL,
                    completed_at      TEXT
                );

                CREATE TABLE IF NOT EXISTS user_stats (
                    id                     INTEGER PRIMARY KEY CHECK(id = 1),
                    total_xp               INTEGER NOT NULL DEFAULT 0,
                    level                  INTEGER NOT NULL DEFAULT 1,
                    current_streak         INTEGER NOT NULL DEFAULT 0,
                    longest_streak         INTEGER NOT NULL DEFAULT 0,
                    last_active_date       TEXT,
                    tasks_completed        INTEGER NOT NULL DEFAULT 0,
                    total_pomodoro_minutes INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS achievements (
                    key         TEXT PRIMARY KEY,
                    unlocked_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
                CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
                CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);

                INSERT OR IGNORE INTO user_stats (id) VALUES (1);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Insert a new task.
    ///
    /// # Errors
    /// Returns a validation error for an empty title, a zero estimate,
    /// or an initial status of done.
    pub fn create_task(&self, new: &NewTask, now: DateTime<Utc>) -> Result<Task> {
        new.validate()?;
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            description: new.description.clone(),
            status: new.status,
            priority: new.priority,
            category: new.category.clone(),
            estimated_minutes: new.estimated_minutes,
            actual_minutes: 0,
            pomodoro_count: 0,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, category,
                                estimated_minutes, actual_minutes, pomodoro_count,
                                due_date, created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.category,
                task.estimated_minutes,
                task.actual_minutes,
                task.pomodoro_count,
                task.due_date.map(|d| d.to_rfc3339()),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
                Option::<String>::None,
            ],
        )?;
        Ok(task)
    }

    /// Fetch a single task.
    ///
    /// # Errors
    /// Returns `CoreError::TaskNotFound` if no task has the given id.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM tasks WHERE id = ?1")
            .map_err(DatabaseError::from)?;
        match stmt.query_row(params![id], task_from_row) {
            Ok(task) => Ok(task),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(CoreError::TaskNotFound { id: id.to_string() })
            }
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    /// List tasks, newest first, with optional filters.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut query = String::from("SELECT * FROM tasks WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            query.push_str(&format!(" AND status = ?{}", args.len() + 1));
            args.push(status.as_str().to_string());
        }
        if let Some(category) = &filter.category {
            query.push_str(&format!(" AND category = ?{}", args.len() + 1));
            args.push(category.clone());
        }
        if let Some(search) = &filter.search {
            query.push_str(&format!(
                " AND (title LIKE ?{n} OR description LIKE ?{m})",
                n = args.len() + 1,
                m = args.len() + 2
            ));
            let pattern = format!("%{search}%");
            args.push(pattern.clone());
            args.push(pattern);
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.conn.prepare(&query).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), task_from_row)
            .map_err(DatabaseError::from)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.map_err(DatabaseError::from)?);
        }
        Ok(tasks)
    }

    /// Merge a partial update into a task.
    ///
    /// Returns the stored task and whether this update crossed the
    /// non-done -> done edge. `completed_at` is stamped on the first such
    /// edge only and never cleared afterwards.
    pub fn update_task(
        &self,
        id: &str,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<(Task, bool)> {
        patch.validate()?;
        let current = self.get_task(id)?;

        let mut updated = current.clone();
        if let Some(title) = &patch.title {
            updated.title = title.clone();
        }
        if let Some(description) = &patch.description {
            updated.description = description.clone();
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if let Some(priority) = patch.priority {
            updated.priority = priority;
        }
        if let Some(category) = &patch.category {
            updated.category = category.clone();
        }
        if let Some(estimate) = patch.estimated_minutes {
            updated.estimated_minutes = estimate;
        }
        if let Some(due) = patch.due_date {
            updated.due_date = due;
        }

        let completed_now =
            current.status != TaskStatus::Done && updated.status == TaskStatus::Done;
        if completed_now && updated.completed_at.is_none() {
            updated.completed_at = Some(now);
        }
        updated.updated_at = now;

        self.conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, status = ?3, priority = ?4, category = ?5,
                 estimated_minutes = ?6, due_date = ?7, updated_at = ?8, completed_at = ?9
             WHERE id = ?10",
            params![
                updated.title,
                updated.description,
                updated.status.as_str(),
                updated.priority.as_str(),
                updated.category,
                updated.estimated_minutes,
                updated.due_date.map(|d| d.to_rfc3339()),
                updated.updated_at.to_rfc3339(),
                updated.completed_at.map(|d| d.to_rfc3339()),
                id,
            ],
        )?;
        Ok((updated, completed_now))
    }

    /// Delete a task. Already-awarded XP is never revoked.
    ///
    /// Returns whether a row was deleted.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Todo/in-progress/done totals.
    pub fn task_counts(&self) -> Result<TaskCounts> {
        let counts = self
            .conn
            .query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'todo' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'in-progress' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0)
                 FROM tasks",
                [],
                |row| {
                    Ok(TaskCounts {
                        total: row.get(0)?,
                        todo: row.get(1)?,
                        in_progress: row.get(2)?,
                        done: row.get(3)?,
                    })
                },
            )
            .map_err(DatabaseError::from)?;
        Ok(counts)
    }

    /// Distinct non-null categories in use.
    pub fn categories(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM tasks WHERE category IS NOT NULL")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(DatabaseError::from)?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row.map_err(DatabaseError::from)?);
        }
        Ok(categories)
    }

    // ── User stats ───────────────────────────────────────────────────

    /// Read the singleton stats aggregate. Pure read, never mutates.
    pub fn user_stats(&self) -> Result<UserStats> {
        let stats = self
            .conn
            .query_row("SELECT * FROM user_stats WHERE id = 1", [], |row| {
                Ok(UserStats {
                    total_xp: row.get("total_xp")?,
                    level: row.get("level")?,
                    current_streak: row.get("current_streak")?,
                    longest_streak: row.get("longest_streak")?,
                    last_active_date: row
                        .get::<_, Option<String>>("last_active_date")?
                        .map(|s| parse_ts(&s))
                        .transpose()?,
                    tasks_completed: row.get("tasks_completed")?,
                    total_pomodoro_minutes: row.get("total_pomodoro_minutes")?,
                })
            })
            .map_err(DatabaseError::from)?;
        Ok(stats)
    }

    /// Apply an update to the stats aggregate as one transaction.
    ///
    /// The read, the policy transition, and the write all happen inside
    /// a single transaction, so a concurrent writer on another handle
    /// can never be silently overwritten by a stale read. Returns the
    /// aggregate as stored.
    pub fn record_award(
        &self,
        update: impl FnOnce(&UserStats) -> UserStats,
    ) -> Result<UserStats> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;
        let stats = self.user_stats()?;
        let updated = update(&stats);
        self.write_user_stats(&updated)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(updated)
    }

    /// Write the whole stats aggregate in one statement.
    fn write_user_stats(&self, stats: &UserStats) -> Result<()> {
        self.conn.execute(
            "UPDATE user_stats
             SET total_xp = ?1, level = ?2, current_streak = ?3, longest_streak = ?4,
                 last_active_date = ?5, tasks_completed = ?6, total_pomodoro_minutes = ?7
             WHERE id = 1",
            params![
                stats.total_xp,
                level_for_xp(stats.total_xp),
                stats.current_streak,
                stats.longest_streak,
                stats.last_active_date.map(|d| d.to_rfc3339()),
                stats.tasks_completed,
                stats.total_pomodoro_minutes,
            ],
        )?;
        Ok(())
    }

    /// Log a finished work interval against a task: bumps the task's
    /// `actual_minutes` and `pomodoro_count`, and the aggregate's
    /// `total_pomodoro_minutes`, in one transaction.
    pub fn add_pomodoro_minutes(
        &self,
        task_id: &str,
        minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        // Existence check up front so a bad id fails before any write.
        self.get_task(task_id)?;
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;
        tx.execute(
            "UPDATE tasks
             SET actual_minutes = actual_minutes + ?1,
                 pomodoro_count = pomodoro_count + 1,
                 updated_at = ?2
             WHERE id = ?3",
            params![minutes, now.to_rfc3339(), task_id],
        )?;
        tx.execute(
            "UPDATE user_stats SET total_pomodoro_minutes = total_pomodoro_minutes + ?1
             WHERE id = 1",
            params![minutes],
        )?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    // ── Achievements ─────────────────────────────────────────────────

    /// Insert an achievement row if absent. Returns whether it was newly
    /// unlocked; an already-unlocked key is a no-op, not an error.
    pub fn unlock_achievement(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO achievements (key, unlocked_at) VALUES (?1, ?2)",
            params![key, now.to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// All unlocked achievement rows as (key, unlocked_at).
    pub fn unlocked_achievements(&self) -> Result<Vec<(String, DateTime<Utc>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, unlocked_at FROM achievements")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let at: String = row.get(1)?;
                Ok((key, parse_ts(&at)?))
            })
            .map_err(DatabaseError::from)?;
        let mut unlocked = Vec::new();
        for row in rows {
            unlocked.push(row.map_err(DatabaseError::from)?);
        }
        Ok(unlocked)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(DatabaseError::from)?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: status
            .parse::<TaskStatus>()
            .map_err(|e| conversion_err(3, e))?,
        priority: priority
            .parse::<Priority>()
            .map_err(|e| conversion_err(4, e))?,
        category: row.get("category")?,
        estimated_minutes: row.get("estimated_minutes")?,
        actual_minutes: row.get("actual_minutes")?,
        pomodoro_count: row.get("pomodoro_count")?,
        due_date: row
            .get::<_, Option<String>>("due_date")?
            .map(|s| parse_ts(&s))
            .transpose()?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
        completed_at: row
            .get::<_, Option<String>>("completed_at")?
            .map(|s| parse_ts(&s))
            .transpose()?,
    })
}

fn parse_ts(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(0, e))
}

fn conversion_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}
