//! User storage. Only the auth service touches the password hash; API
//! responses carry the `common` [`User`] shape.

use common::model::user::User;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{now_rfc3339, Db, DbError, DbResult};

/// Internal record pairing the API-facing user with its password hash.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub password_hash: String,
}

const COLUMNS: &str =
    "id, username, display_name, role, is_active, created_at, updated_at, password_hash";

fn row_to_auth_user(row: &Row) -> rusqlite::Result<AuthUser> {
    Ok(AuthUser {
        user: User {
            id: row.get(0)?,
            username: row.get(1)?,
            display_name: row.get(2)?,
            role: row.get(3)?,
            is_active: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        },
        password_hash: row.get(7)?,
    })
}

impl Db {
    pub fn create_user(
        &self,
        username: &str,
        display_name: &str,
        role: &str,
        password_hash: &str,
    ) -> DbResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DbError::Validation(
                "Tên đăng nhập không được để trống".into(),
            ));
        }

        let now = now_rfc3339();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            role: role.to_string(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, display_name, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id,
                user.username,
                password_hash,
                user.display_name,
                user.role,
                user.is_active,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(user)
    }

    pub fn find_user_by_username(&self, username: &str) -> DbResult<Option<AuthUser>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE username = ?1 AND is_active = 1"),
            [username],
            row_to_auth_user,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
            [id],
            row_to_auth_user,
        )
        .optional()
        .map(|opt| opt.map(|au| au.user))
        .map_err(Into::into)
    }

    pub fn count_users(&self) -> DbResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
