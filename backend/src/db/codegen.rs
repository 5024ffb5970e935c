//! Human-readable code generation.
//!
//! Two schemes are used across the data model:
//!
//! * sequential codes (`SG-0001`, `KH-0023`, ...) backed by the `sequences`
//!   counter table, claimed with a single atomic UPSERT so concurrent creates
//!   can never observe the same value;
//! * initials codes for taxonomy groups and positions, derived from the name
//!   and disambiguated with a numeric suffix under a bounded retry.

use rusqlite::Connection;

use super::{DbError, DbResult};

/// Claim the next value of the named counter and format it `PREFIX-NNNN`.
pub fn next_sequential_code(conn: &Connection, prefix: &str) -> DbResult<String> {
    let value: i64 = conn.query_row(
        "INSERT INTO sequences (prefix, value) VALUES (?1, 1)
         ON CONFLICT(prefix) DO UPDATE SET value = value + 1
         RETURNING value",
        [prefix],
        |row| row.get(0),
    )?;
    Ok(format!("{}-{:04}", prefix, value))
}

/// Derive an uppercase code from the initials of whitespace/hyphen-separated
/// words. Names yielding fewer than two initials fall back to the first four
/// alphanumeric characters instead.
pub fn initials_code(name: &str) -> String {
    let initials: String = name
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .map(fold_upper)
        .collect();

    if initials.chars().count() >= 2 {
        initials
    } else {
        name.chars()
            .filter(|c| c.is_alphanumeric())
            .take(4)
            .map(fold_upper)
            .collect()
    }
}

/// Base code for a child entry: first two characters of the parent group's
/// code, a dash, then the child's own initials.
pub fn child_code_base(parent_code: &str, name: &str) -> String {
    let prefix: String = parent_code.chars().take(2).collect();
    format!("{}-{}", prefix, initials_code(name))
}

/// Resolve `base` against the `code` column of `table`, appending `2`, `3`,
/// ... until the candidate is free. Attempts are bounded so a pathological
/// dataset fails loudly instead of looping.
pub fn unique_code(conn: &Connection, table: &str, base: &str) -> DbResult<String> {
    if !code_exists(conn, table, base)? {
        return Ok(base.to_string());
    }
    for n in 2..100u32 {
        let candidate = format!("{}{}", base, n);
        if !code_exists(conn, table, &candidate)? {
            return Ok(candidate);
        }
    }
    Err(DbError::Constraint(format!(
        "Không thể sinh mã duy nhất cho '{}'",
        base
    )))
}

fn code_exists(conn: &Connection, table: &str, code: &str) -> DbResult<bool> {
    // `table` is always one of our own static table names, never user input.
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE code = ?1)", table);
    let exists: i64 = conn.query_row(&sql, [code], |row| row.get(0))?;
    Ok(exists != 0)
}

/// Uppercase a character, folding Vietnamese diacritics to their ASCII base
/// so "điện" contributes `D` rather than `Đ`.
fn fold_upper(c: char) -> char {
    const FOLDS: &[(&str, char)] = &[
        ("àáạảãâầấậẩẫăằắặẳẵ", 'A'),
        ("èéẹẻẽêềếệểễ", 'E'),
        ("ìíịỉĩ", 'I'),
        ("òóọỏõôồốộổỗơờớợởỡ", 'O'),
        ("ùúụủũưừứựửữ", 'U'),
        ("ỳýỵỷỹ", 'Y'),
        ("đ", 'D'),
    ];

    let lower = c.to_lowercase().next().unwrap_or(c);
    for (accented, base) in FOLDS {
        if accented.contains(lower) {
            return *base;
        }
    }
    lower.to_uppercase().next().unwrap_or(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    #[test]
    fn sequential_codes_increment() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.lock();
        assert_eq!(next_sequential_code(&conn, "SG").unwrap(), "SG-0001");
        assert_eq!(next_sequential_code(&conn, "SG").unwrap(), "SG-0002");
        // Independent counters per prefix.
        assert_eq!(next_sequential_code(&conn, "KH").unwrap(), "KH-0001");
        assert_eq!(next_sequential_code(&conn, "SG").unwrap(), "SG-0003");
    }

    #[test]
    fn initials_from_words() {
        assert_eq!(initials_code("Chăm sóc định kỳ"), "CSDK");
        assert_eq!(initials_code("Gọi điện - Email"), "GDE");
        // En-dash separators contribute no initial of their own.
        assert_eq!(initials_code("Gọi điện – Email"), "GDE");
        assert_eq!(initials_code("Spa"), "SPA");
        assert_eq!(initials_code("Tư vấn"), "TV");
    }

    #[test]
    fn short_names_fall_back_to_leading_characters() {
        // Single word, single initial: take leading alphanumerics instead.
        assert_eq!(initials_code("Zalo"), "ZALO");
        assert_eq!(initials_code("X"), "X");
    }

    #[test]
    fn child_code_uses_parent_prefix() {
        assert_eq!(child_code_base("GDE", "Không nghe máy"), "GD-KNM");
        assert_eq!(child_code_base("TV2", "Hẹn gặp"), "TV-HG");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.lock();
        let insert = |code: &str| {
            conn.execute(
                "INSERT INTO care_groups (id, name, code, created_at, updated_at)
                 VALUES (?1, 'x', ?2, '', '')",
                [code, code],
            )
            .unwrap();
        };

        assert_eq!(unique_code(&conn, "care_groups", "GDE").unwrap(), "GDE");
        insert("GDE");
        assert_eq!(unique_code(&conn, "care_groups", "GDE").unwrap(), "GDE2");
        insert("GDE2");
        assert_eq!(unique_code(&conn, "care_groups", "GDE").unwrap(), "GDE3");
    }
}
