use chrono::{DateTime, Utc};
use courier_types::error::{Error, Result};
use courier_types::models::{UserDetail, UserSummary};
use rusqlite::Connection;
use tracing::debug;

use crate::Database;
use crate::error::{Constraint, StoreResultExt, constraint_of, unavailable};
use crate::models::NewUser;

impl Database {
    /// Insert a user. `join_at` and `last_login_at` both start at now.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserSummary> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users
                    (username, password_hash, first_name, last_name, phone, join_at, last_login_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![
                    user.username,
                    user.password_hash,
                    user.first_name,
                    user.last_name,
                    user.phone,
                    now,
                ],
            )
            .map_err(|e| match constraint_of(&e) {
                Some(Constraint::Unique) => Error::DuplicateIdentity(user.username.to_string()),
                _ => unavailable(e),
            })?;

            debug!("Created user {}", user.username);
            Ok(UserSummary {
                username: user.username.to_string(),
                first_name: user.first_name.to_string(),
                last_name: user.last_name.to_string(),
                phone: user.phone.to_string(),
            })
        })
    }

    /// Stored password hash, if the user exists.
    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT password_hash FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn touch_login(&self, username: &str) -> Result<()> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET last_login_at = ?2 WHERE username = ?1",
                    rusqlite::params![username, now],
                )
                .store()?;

            if changed == 0 {
                return Err(Error::NotFound(format!("No such user: {}", username)));
            }
            Ok(())
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.with_conn(query_users)
    }

    pub fn get_user(&self, username: &str) -> Result<UserDetail> {
        self.with_conn(|conn| query_user(conn, username))?
            .ok_or_else(|| Error::NotFound(format!("No such user: {}", username)))
    }
}

fn query_users(conn: &Connection) -> Result<Vec<UserSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT username, first_name, last_name, phone
             FROM users
             ORDER BY username",
        )
        .store()?;

    let rows = stmt
        .query_map([], |row| {
            Ok(UserSummary {
                username: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                phone: row.get(3)?,
            })
        })
        .store()?
        .collect::<std::result::Result<Vec<_>, _>>()
        .store()?;

    Ok(rows)
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserDetail>> {
    conn.query_row(
        "SELECT username, first_name, last_name, phone, join_at, last_login_at
         FROM users
         WHERE username = ?1",
        [username],
        |row| {
            Ok(UserDetail {
                username: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                phone: row.get(3)?,
                join_at: row.get::<_, DateTime<Utc>>(4)?,
                last_login_at: row.get(5)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser<'_> {
        NewUser {
            username,
            password_hash: "$argon2id$stub",
            first_name: "First",
            last_name: "Last",
            phone: "555-0100",
        }
    }

    #[test]
    fn create_and_get_user() {
        let db = Database::open_in_memory().unwrap();
        let summary = db.create_user(&new_user("alice")).unwrap();
        assert_eq!(summary.username, "alice");

        let detail = db.get_user("alice").unwrap();
        assert_eq!(detail.first_name, "First");
        assert_eq!(detail.last_login_at, Some(detail.join_at));
        assert!((Utc::now() - detail.join_at).num_seconds() < 5);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("alice")).unwrap();

        let err = db.create_user(&new_user("alice")).unwrap_err();
        assert_eq!(err, Error::DuplicateIdentity("alice".into()));
    }

    #[test]
    fn list_is_ordered_by_username() {
        let db = Database::open_in_memory().unwrap();
        for name in ["carol", "alice", "bob"] {
            db.create_user(&new_user(name)).unwrap();
        }

        let names: Vec<_> = db
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn missing_user_lookups() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_password_hash("ghost").unwrap(), None);
        assert!(matches!(db.get_user("ghost"), Err(Error::NotFound(_))));
        assert!(matches!(db.touch_login("ghost"), Err(Error::NotFound(_))));
    }

    #[test]
    fn touch_login_advances_timestamp() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("alice")).unwrap();
        let before = db.get_user("alice").unwrap().last_login_at.unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        db.touch_login("alice").unwrap();

        let after = db.get_user("alice").unwrap().last_login_at.unwrap();
        assert!(after > before);
    }
}
