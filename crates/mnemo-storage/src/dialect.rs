// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-dialect SQL rendering.
//!
//! Driver families write their statements once with `?` placeholders and the
//! dialect's idempotent-insert and upsert forms; [`Dialect`] renders them for
//! one backend.

/// How positional parameters are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?1, ?2, ...` (SQLite)
    Numbered,
    /// `$1, $2, ...` (PostgreSQL)
    Dollar,
    /// `?, ?, ...` (MySQL / MariaDB)
    Anonymous,
    /// `:1, :2, ...` (Oracle)
    Colon,
}

/// Statement syntax for one storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub name: &'static str,
    pub placeholder: Placeholder,
    /// Prefix for "insert if absent".
    pub insert_ignore: &'static str,
    /// Suffix for "insert if absent".
    pub ignore_suffix: &'static str,
    /// How an upsert clause is introduced.
    pub upsert: Upsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// `ON CONFLICT (cols) DO UPDATE SET ...` (SQLite, PostgreSQL)
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE ...` (MySQL / MariaDB)
    OnDuplicateKey,
    /// `MERGE INTO ... USING (SELECT ... FROM DUAL)` (Oracle). Also used for
    /// insert-if-absent, so `insert_ignore` and `ignore_suffix` are unused.
    Merge,
}

impl Dialect {
    /// Rewrite every `?` in `template` into this dialect's placeholder syntax.
    pub fn render(&self, template: &str) -> String {
        if self.placeholder == Placeholder::Anonymous {
            return template.to_string();
        }
        let mut out = String::with_capacity(template.len() + 8);
        let mut n = 0;
        for ch in template.chars() {
            if ch == '?' {
                n += 1;
                out.push(match self.placeholder {
                    Placeholder::Dollar => '$',
                    Placeholder::Colon => ':',
                    _ => '?',
                });
                out.push_str(&n.to_string());
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// `INSERT ... (columns) VALUES (?, ...)` that silently skips rows
    /// violating the unique constraint on `key`.
    pub fn insert_if_absent(&self, table: &str, columns: &[&str], key: &[&str]) -> String {
        let template = if self.upsert == Upsert::Merge {
            format!(
                "{} WHEN NOT MATCHED THEN {}",
                merge_head(table, columns, key),
                merge_insert(columns, "")
            )
        } else {
            format!(
                "{} {table} ({}) VALUES ({}){}",
                self.insert_ignore,
                columns.join(", "),
                vec!["?"; columns.len()].join(", "),
                self.ignore_suffix,
            )
        };
        self.render(&template)
    }

    /// "Insert or increment": a new row starts with `num_times = 1`; a row
    /// that collides on `conflict` increments `num_times` and refreshes
    /// `date_last_time`.
    pub fn insert_or_increment(&self, table: &str, columns: &[&str], conflict: &[&str]) -> String {
        let update = match self.upsert {
            Upsert::OnConflict => format!(
                " ON CONFLICT ({}) DO UPDATE SET num_times = {table}.num_times + 1, \
                 date_last_time = CURRENT_TIMESTAMP",
                conflict.join(", ")
            ),
            Upsert::OnDuplicateKey => " ON DUPLICATE KEY UPDATE num_times = num_times + 1, \
                 date_last_time = CURRENT_TIMESTAMP"
                .to_string(),
            Upsert::Merge => {
                return self.render(&format!(
                    "{} WHEN MATCHED THEN UPDATE SET dst.num_times = dst.num_times + 1, \
                     dst.date_last_time = CURRENT_TIMESTAMP WHEN NOT MATCHED THEN {}",
                    merge_head(table, columns, conflict),
                    merge_insert(columns, ", num_times, date_last_time"),
                ));
            }
        };
        let template = format!(
            "INSERT INTO {table} ({}, num_times, date_last_time) VALUES ({}, 1, CURRENT_TIMESTAMP){update}",
            columns.join(", "),
            vec!["?"; columns.len()].join(", "),
        );
        self.render(&template)
    }
}

/// `MERGE INTO table dst USING (one bound row) src ON (key columns equal)`.
fn merge_head(table: &str, columns: &[&str], key: &[&str]) -> String {
    let source: Vec<String> = columns.iter().map(|c| format!("? AS {c}")).collect();
    let on: Vec<String> = key.iter().map(|k| format!("dst.{k} = src.{k}")).collect();
    format!(
        "MERGE INTO {table} dst USING (SELECT {} FROM DUAL) src ON ({})",
        source.join(", "),
        on.join(" AND "),
    )
}

/// The `INSERT` arm of a merge. `counters` adds `num_times` and
/// `date_last_time` columns when non-empty.
fn merge_insert(columns: &[&str], counters: &str) -> String {
    let values: Vec<String> = columns.iter().map(|c| format!("src.{c}")).collect();
    let counter_values = if counters.is_empty() { "" } else { ", 1, CURRENT_TIMESTAMP" };
    format!(
        "INSERT ({}{counters}) VALUES ({}{counter_values})",
        columns.join(", "),
        values.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use crate::driver::{mysql, oracle, postgres, sqlite};

    #[test]
    fn numbered_placeholders() {
        assert_eq!(
            sqlite::DRIVER.dialect.render("SELECT id FROM t WHERE a = ? AND b = ?"),
            "SELECT id FROM t WHERE a = ?1 AND b = ?2"
        );
    }

    #[test]
    fn dollar_placeholders() {
        assert_eq!(
            postgres::DRIVER.dialect.render("UPDATE t SET a = ? WHERE id = ?"),
            "UPDATE t SET a = $1 WHERE id = $2"
        );
    }

    #[test]
    fn anonymous_placeholders_untouched() {
        assert_eq!(mysql::DRIVER.dialect.render("a = ? AND b = ?"), "a = ? AND b = ?");
    }

    #[test]
    fn colon_placeholders() {
        assert_eq!(
            oracle::DRIVER.dialect.render("SELECT id FROM t WHERE a = ? AND b = ?"),
            "SELECT id FROM t WHERE a = :1 AND b = :2"
        );
    }

    #[test]
    fn insert_if_absent_per_dialect() {
        assert_eq!(
            sqlite::DRIVER.dialect.insert_if_absent("mnemo_entity", &["uuid", "external_id"], &["external_id"]),
            "INSERT OR IGNORE INTO mnemo_entity (uuid, external_id) VALUES (?1, ?2)"
        );
        assert_eq!(
            postgres::DRIVER.dialect.insert_if_absent("mnemo_entity", &["uuid", "external_id"], &["external_id"]),
            "INSERT INTO mnemo_entity (uuid, external_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        );
        assert_eq!(
            mysql::DRIVER.dialect.insert_if_absent("mnemo_entity", &["uuid", "external_id"], &["external_id"]),
            "INSERT IGNORE INTO mnemo_entity (uuid, external_id) VALUES (?, ?)"
        );
        assert_eq!(
            oracle::DRIVER.dialect.insert_if_absent("mnemo_entity", &["uuid", "external_id"], &["external_id"]),
            "MERGE INTO mnemo_entity dst USING (SELECT :1 AS uuid, :2 AS external_id FROM DUAL) src \
             ON (dst.external_id = src.external_id) \
             WHEN NOT MATCHED THEN INSERT (uuid, external_id) VALUES (src.uuid, src.external_id)"
        );
    }

    #[test]
    fn upsert_per_dialect() {
        let pg = postgres::DRIVER.dialect.insert_or_increment(
            "mnemo_entity_fact",
            &["uuid", "entity_id", "content", "uniq"],
            &["entity_id", "uniq"],
        );
        assert!(pg.contains("VALUES ($1, $2, $3, $4, 1, CURRENT_TIMESTAMP)"));
        assert!(pg.contains("ON CONFLICT (entity_id, uniq) DO UPDATE SET num_times = mnemo_entity_fact.num_times + 1"));

        let my = mysql::DRIVER.dialect.insert_or_increment(
            "mnemo_entity_fact",
            &["uuid", "entity_id", "content", "uniq"],
            &["entity_id", "uniq"],
        );
        assert!(my.ends_with("ON DUPLICATE KEY UPDATE num_times = num_times + 1, date_last_time = CURRENT_TIMESTAMP"));

        let ora = oracle::DRIVER.dialect.insert_or_increment(
            "mnemo_process_attribute",
            &["uuid", "process_id", "content", "uniq"],
            &["process_id", "uniq"],
        );
        assert!(ora.starts_with("MERGE INTO mnemo_process_attribute dst USING (SELECT :1 AS uuid, :2 AS process_id, :3 AS content, :4 AS uniq FROM DUAL) src"));
        assert!(ora.contains("ON (dst.process_id = src.process_id AND dst.uniq = src.uniq)"));
        assert!(ora.contains("WHEN MATCHED THEN UPDATE SET dst.num_times = dst.num_times + 1"));
        assert!(ora.ends_with(
            "INSERT (uuid, process_id, content, uniq, num_times, date_last_time) \
             VALUES (src.uuid, src.process_id, src.content, src.uniq, 1, CURRENT_TIMESTAMP)"
        ));
    }

    proptest::proptest! {
        #[test]
        fn dollar_render_numbers_every_placeholder(parts in proptest::collection::vec("[a-z =,]{0,8}", 1..12)) {
            let template = parts.join("?");
            let rendered = postgres::DRIVER.dialect.render(&template);
            let expected = parts.len() - 1;
            proptest::prop_assert_eq!(rendered.matches('$').count(), expected);
            if expected > 0 {
                let last = format!("${expected}");
                proptest::prop_assert!(rendered.contains(&last));
            }
            proptest::prop_assert!(!rendered.contains('?'));
        }
    }
}
