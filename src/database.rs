use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{sort_tasks, Priority, Task, TaskList};

pub const APP_DIR: &str = "taskpad";
pub const DB_FILE: &str = "taskpad.db";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("failed to migrate database: {0}")]
    Migrate(rusqlite::Error),
    #[error("failed to begin transaction: {0}")]
    Begin(rusqlite::Error),
    #[error("failed to query tasks: {0}")]
    Query(rusqlite::Error),
    #[error("failed to delete task {id}: {source}")]
    Delete { id: String, source: rusqlite::Error },
    #[error("failed to update task {id}: {source}")]
    Update { id: String, source: rusqlite::Error },
    #[error("failed to insert task {id}: {source}")]
    Insert { id: String, source: rusqlite::Error },
    #[error("failed to commit transaction: {0}")]
    Commit(rusqlite::Error),
    #[error("failed to close database: {0}")]
    Close(rusqlite::Error),
}

/// Where the database lives when no override is given: the per-user config
/// directory, or the working directory if that cannot be created.
pub fn default_path() -> PathBuf {
    let Some(dir) = dirs::config_dir().map(|dir| dir.join(APP_DIR)) else {
        return PathBuf::from(DB_FILE);
    };
    match fs::create_dir_all(&dir) {
        Ok(()) => dir.join(DB_FILE),
        Err(e) => {
            log::warn!("cannot create {}: {e}, using ./{DB_FILE}", dir.display());
            PathBuf::from(DB_FILE)
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("opened {}", path.display());
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        // Create tables if they don't exist
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL,
                has_deadline INTEGER NOT NULL DEFAULT 0,
                deadline TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .map_err(StoreError::Migrate)?;

        Ok(Database { conn })
    }

    /// Reads every record, in canonical order.
    pub fn load(&self) -> Result<TaskList, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, done, priority, has_deadline, deadline FROM tasks
                 ORDER BY done ASC, priority DESC, has_deadline DESC, deadline ASC, title ASC",
            )
            .map_err(StoreError::Query)?;

        let rows = stmt
            .query_map([], |row| {
                let level: i64 = row.get(3)?;
                let has_deadline: bool = row.get(4)?;
                let deadline: Option<DateTime<Utc>> = row.get(5)?;
                Ok((
                    Task {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        done: row.get(2)?,
                        priority: Priority::default(),
                        deadline: deadline
                            .filter(|_| has_deadline)
                            .map(|d| d.with_timezone(&Local)),
                    },
                    level,
                ))
            })
            .map_err(StoreError::Query)?;

        let mut tasks = Vec::new();
        for row in rows {
            let (mut task, level) = row.map_err(StoreError::Query)?;
            task.priority = Priority::from_level(level).unwrap_or_else(|| {
                log::warn!("task {} has unknown priority {level}", task.id);
                Priority::default()
            });
            tasks.push(task);
        }

        Ok(TaskList::new(tasks))
    }

    /// Makes the store hold exactly `tasks`: records missing from the list are
    /// deleted, known ones updated, new ones inserted, all in one transaction.
    /// Pass the complete list; absence is what signals deletion.
    pub fn save(&mut self, tasks: &[Task]) -> Result<(), StoreError> {
        let mut tasks = tasks.to_vec();
        sort_tasks(&mut tasks);

        let tx = self.conn.transaction().map_err(StoreError::Begin)?;

        let existing: HashSet<String> = {
            let mut stmt = tx.prepare("SELECT id FROM tasks").map_err(StoreError::Query)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(StoreError::Query)?;
            rows.collect::<Result<_, _>>().map_err(StoreError::Query)?
        };

        let keep: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        for id in existing.iter().filter(|id| !keep.contains(id.as_str())) {
            tx.execute("DELETE FROM tasks WHERE id = ?1", [id])
                .map_err(|source| StoreError::Delete {
                    id: id.clone(),
                    source,
                })?;
        }

        for task in &tasks {
            let deadline = task.deadline.map(|d| d.with_timezone(&Utc));
            if existing.contains(&task.id) {
                tx.execute(
                    "UPDATE tasks SET title = ?2, done = ?3, priority = ?4, has_deadline = ?5,
                     deadline = ?6, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
                    params![
                        task.id,
                        task.title,
                        task.done,
                        task.priority.level(),
                        task.has_deadline(),
                        deadline
                    ],
                )
                .map_err(|source| StoreError::Update {
                    id: task.id.clone(),
                    source,
                })?;
            } else {
                tx.execute(
                    "INSERT INTO tasks (id, title, done, priority, has_deadline, deadline)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        task.id,
                        task.title,
                        task.done,
                        task.priority.level(),
                        task.has_deadline(),
                        deadline
                    ],
                )
                .map_err(|source| StoreError::Insert {
                    id: task.id.clone(),
                    source,
                })?;
            }
        }

        tx.commit().map_err(StoreError::Commit)?;
        log::debug!("saved {} tasks", tasks.len());
        Ok(())
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Close(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{at, task};
    use chrono::Duration;
    use tempfile::TempDir;

    fn stored_ids(db: &Database) -> Vec<String> {
        let mut stmt = db.conn.prepare("SELECT id FROM tasks ORDER BY id").unwrap();
        let rows = stmt.query_map([], |row| row.get(0)).unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    fn mixed() -> Vec<Task> {
        let mut done = task("d", "done", Priority::High);
        done.done = true;
        let mut dated = task("c", "dated", Priority::Low);
        dated.deadline = Some(at(2031, 7, 8, 9, 10) + Duration::milliseconds(250));
        vec![
            task("b", "B", Priority::Low),
            done,
            task("a", "A", Priority::High),
            dated,
        ]
    }

    #[test]
    fn load_after_save_returns_sorted_list() {
        let mut db = Database::open_in_memory().unwrap();
        let tasks = mixed();
        db.save(&tasks).unwrap();
        let loaded = db.load().unwrap();
        assert_eq!(loaded, TaskList::new(tasks));
        assert_eq!(loaded.as_slice()[0].title, "A");
    }

    #[test]
    fn omitted_ids_are_deleted() {
        let mut db = Database::open_in_memory().unwrap();
        db.save(&mixed()).unwrap();
        let fewer: Vec<Task> = mixed().into_iter().filter(|t| t.id != "b").collect();
        db.save(&fewer).unwrap();
        assert_eq!(stored_ids(&db), vec!["a", "c", "d"]);

        db.save(&[]).unwrap();
        assert!(stored_ids(&db).is_empty());
    }

    #[test]
    fn existing_records_are_updated_in_place() {
        let mut db = Database::open_in_memory().unwrap();
        db.save(&mixed()).unwrap();

        let mut tasks = mixed();
        for t in tasks.iter_mut() {
            if t.id == "c" {
                t.title = "renamed".into();
                t.done = true;
                t.priority = Priority::Medium;
                t.deadline = None;
            }
        }
        db.save(&tasks).unwrap();

        let loaded = db.load().unwrap();
        let renamed = loaded.find("c").unwrap();
        assert_eq!(renamed.title, "renamed");
        assert!(renamed.done);
        assert_eq!(renamed.priority, Priority::Medium);
        assert_eq!(renamed.deadline, None);
        assert_eq!(loaded.len(), 4);
    }

    #[test]
    fn deadline_without_flag_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO tasks (id, title, done, priority, has_deadline, deadline)
                 VALUES ('x', 'x', 0, 9, 0, '2030-01-01 00:00:00+00:00')",
                [],
            )
            .unwrap();
        let loaded = db.load().unwrap();
        let t = loaded.find("x").unwrap();
        assert_eq!(t.deadline, None);
        assert_eq!(t.priority, Priority::Medium);
    }

    #[test]
    fn failed_save_reports_the_step() {
        let mut db = Database::open_in_memory().unwrap();
        db.conn.execute("DROP TABLE tasks", []).unwrap();
        let err = db.save(&mixed()).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(err.to_string().starts_with("failed to query tasks"));
    }

    #[test]
    fn failed_insert_rolls_back_deletes() {
        let mut db = Database::open_in_memory().unwrap();
        db.save(&mixed()).unwrap();
        // Force every insert to fail.
        db.conn
            .execute(
                "CREATE TRIGGER no_new BEFORE INSERT ON tasks BEGIN SELECT RAISE(ABORT, 'nope'); END",
                [],
            )
            .unwrap();
        let replacement = vec![task("z", "new", Priority::Low)];
        let err = db.save(&replacement).unwrap_err();
        assert!(matches!(err, StoreError::Insert { ref id, .. } if id == "z"));
        assert_eq!(stored_ids(&db), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DB_FILE);

        let mut db = Database::open(&path).unwrap();
        db.save(&mixed()).unwrap();
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load().unwrap(), TaskList::new(mixed()));
    }

    #[test]
    fn open_reports_bad_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join(DB_FILE);
        let err = Database::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Open { .. }));
    }
}
