pub mod queries;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, params};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct HabitRow {
    pub id: i64,
    pub name: String,
    pub date_created: NaiveDate,
    pub is_bad: bool,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn create_habit(
        &self,
        name: &str,
        date_created: NaiveDate,
        is_bad: bool,
    ) -> Result<HabitRow> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!("Habit name must not be empty");
        }

        let inserted = self.conn.execute(
            "INSERT INTO habits (name, date_created, is_bad) VALUES (?1, ?2, ?3)",
            params![trimmed, date_created, is_bad],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(error, _))
                if error.code == ErrorCode::ConstraintViolation =>
            {
                bail!("A habit named '{trimmed}' already exists");
            }
            Err(error) => return Err(error).context("Failed to insert habit"),
        }

        let id = self.conn.last_insert_rowid();
        Ok(HabitRow {
            id,
            name: trimmed.to_string(),
            date_created,
            is_bad,
        })
    }

    pub fn habit_by_id(&self, id: i64) -> Result<Option<HabitRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, date_created, is_bad FROM habits WHERE id = ?1",
                params![id],
                map_habit_row,
            )
            .ok();

        Ok(row)
    }

    pub fn habit_by_name(&self, name: &str) -> Result<Option<HabitRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, date_created, is_bad FROM habits WHERE name = ?1",
                params![name.trim()],
                map_habit_row,
            )
            .ok();

        Ok(row)
    }

    pub fn list_habits(&self) -> Result<Vec<HabitRow>> {
        let mut statement = self
            .conn
            .prepare("SELECT id, name, date_created, is_bad FROM habits ORDER BY name ASC")?;

        let rows = statement
            .query_map([], map_habit_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list habits")?;

        Ok(rows)
    }

    pub fn habit_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM habits", [], |row| row.get(0))
            .context("Failed to count habits")?;

        Ok(count as usize)
    }

    pub fn delete_habit(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![id])
            .context("Failed to delete habit")?;

        Ok(deleted > 0)
    }

    /// Completion dates for one habit, most recent first. This is the exact
    /// input shape the stats engine scans.
    pub fn completions_for_habit(&self, habit_id: i64) -> Result<Vec<NaiveDate>> {
        let mut statement = self.conn.prepare(
            "SELECT date FROM completions WHERE habit_id = ?1 ORDER BY date DESC",
        )?;

        let dates = statement
            .query_map(params![habit_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query completions")?;

        Ok(dates)
    }

    pub fn is_completed(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM completions WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, date],
                |_| Ok(()),
            )
            .ok();

        Ok(found.is_some())
    }

    pub fn complete(&self, habit_id: i64, date: NaiveDate) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO completions (habit_id, date) VALUES (?1, ?2)",
                params![habit_id, date],
            )
            .context("Failed to insert completion")?;

        Ok(())
    }

    pub fn uncomplete(&self, habit_id: i64, date: NaiveDate) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM completions WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, date],
            )
            .context("Failed to delete completion")?;

        Ok(())
    }

    /// Create the completion if absent, delete it otherwise. Returns the new
    /// completion state for that date.
    pub fn toggle_completion(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        if self.is_completed(habit_id, date)? {
            self.uncomplete(habit_id, date)?;
            Ok(false)
        } else {
            self.complete(habit_id, date)?;
            Ok(true)
        }
    }

    pub fn latest_completion(&self) -> Result<Option<NaiveDate>> {
        let date = self
            .conn
            .query_row(
                "SELECT date FROM completions ORDER BY date DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();

        Ok(date)
    }
}

fn map_habit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok(HabitRow {
        id: row.get(0)?,
        name: row.get(1)?,
        date_created: row.get(2)?,
        is_bad: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::stats::HabitStats;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    fn open_test_db(dir: &tempfile::TempDir) -> Database {
        Database::open(&dir.path().join("habits.db")).expect("open database")
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date") - Duration::days(offset)
    }

    #[test]
    fn habit_names_are_unique() {
        let dir = tempdir().expect("tempdir");
        let database = open_test_db(&dir);

        database
            .create_habit("Read", day(0), false)
            .expect("first insert");
        let duplicate = database.create_habit("Read", day(0), false);

        assert!(duplicate.is_err());
    }

    #[test]
    fn completions_come_back_descending() {
        let dir = tempdir().expect("tempdir");
        let database = open_test_db(&dir);
        let habit = database
            .create_habit("Read", day(10), false)
            .expect("create habit");

        for offset in [5, 1, 3] {
            database.complete(habit.id, day(offset)).expect("complete");
        }

        let dates = database
            .completions_for_habit(habit.id)
            .expect("completions");
        assert_eq!(dates, vec![day(1), day(3), day(5)]);
    }

    #[test]
    fn completing_twice_is_a_no_op() {
        let dir = tempdir().expect("tempdir");
        let database = open_test_db(&dir);
        let habit = database
            .create_habit("Read", day(10), false)
            .expect("create habit");

        database.complete(habit.id, day(1)).expect("complete");
        database.complete(habit.id, day(1)).expect("complete again");

        let dates = database
            .completions_for_habit(habit.id)
            .expect("completions");
        assert_eq!(dates.len(), 1);
    }

    #[test]
    fn toggle_on_then_off_restores_stats() {
        let dir = tempdir().expect("tempdir");
        let database = open_test_db(&dir);
        let habit = database
            .create_habit("Read", day(20), false)
            .expect("create habit");

        for offset in [1, 2, 5] {
            database.complete(habit.id, day(offset)).expect("complete");
        }

        let stats_for = |database: &Database| {
            let dates = database
                .completions_for_habit(habit.id)
                .expect("completions");
            HabitStats::compute(habit.is_bad, habit.date_created, &dates, day(0))
        };

        let before = stats_for(&database);
        assert!(database.toggle_completion(habit.id, day(0)).expect("on"));
        assert!(!database.toggle_completion(habit.id, day(0)).expect("off"));
        assert_eq!(stats_for(&database), before);
    }

    #[test]
    fn deleting_a_habit_removes_its_completions() {
        let dir = tempdir().expect("tempdir");
        let database = open_test_db(&dir);
        let habit = database
            .create_habit("Read", day(10), false)
            .expect("create habit");
        database.complete(habit.id, day(1)).expect("complete");

        assert!(database.delete_habit(habit.id).expect("delete"));
        assert_eq!(database.latest_completion().expect("latest"), None);
    }
}
