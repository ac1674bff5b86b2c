pub const CREATE_HABITS: &str = r#"
CREATE TABLE IF NOT EXISTS habits (
  id           INTEGER PRIMARY KEY AUTOINCREMENT,
  name         TEXT NOT NULL UNIQUE,
  date_created TEXT NOT NULL,
  is_bad       INTEGER NOT NULL DEFAULT 0
);
"#;

pub const CREATE_COMPLETIONS: &str = r#"
CREATE TABLE IF NOT EXISTS completions (
  id       INTEGER PRIMARY KEY AUTOINCREMENT,
  habit_id INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
  date     TEXT NOT NULL,
  UNIQUE(habit_id, date)
);
"#;

pub const INDEX_COMPLETIONS_HABIT_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_completions_habit_date ON completions(habit_id, date DESC);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_HABITS,
        CREATE_COMPLETIONS,
        INDEX_COMPLETIONS_HABIT_DATE,
    ]
}
