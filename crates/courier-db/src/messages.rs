use chrono::{DateTime, Utc};
use courier_types::error::{Error, Result};
use courier_types::models::{
    IdentitySnippet, Message, MessageDetail, ReadReceipt, ReceivedMessage, SentMessage,
};
use rusqlite::{Connection, Row};
use tracing::debug;

use crate::Database;
use crate::error::{Constraint, StoreResultExt, constraint_of, unavailable};
use crate::models::NewMessage;

impl Database {
    pub fn insert_message(&self, msg: &NewMessage<'_>) -> Result<Message> {
        let sent_at = Utc::now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (from_username, to_username, body, sent_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![msg.from_username, msg.to_username, msg.body, sent_at],
            )
            .map_err(|e| match constraint_of(&e) {
                Some(Constraint::ForeignKey) => Error::ReferentialViolation(format!(
                    "message from {} to {}",
                    msg.from_username, msg.to_username
                )),
                _ => unavailable(e),
            })?;

            let id = conn.last_insert_rowid();
            debug!("Stored message {} from {} to {}", id, msg.from_username, msg.to_username);

            Ok(Message {
                id,
                from_username: msg.from_username.to_string(),
                to_username: msg.to_username.to_string(),
                body: msg.body.to_string(),
                sent_at,
                read_at: None,
            })
        })
    }

    /// Set `read_at` if it is still null. A message already read keeps its
    /// original timestamp, which is what gets returned.
    pub fn mark_read(&self, id: i64) -> Result<ReadReceipt> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction().store()?;

            tx.execute(
                "UPDATE messages SET read_at = ?2 WHERE id = ?1 AND read_at IS NULL",
                rusqlite::params![id, now],
            )
            .store()?;

            // After the update a read_at can only be null if the row is absent
            let read_at: DateTime<Utc> = tx
                .query_row(
                    "SELECT read_at FROM messages WHERE id = ?1 AND read_at IS NOT NULL",
                    [id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| Error::NotFound(format!("No such message: {}", id)))?;

            tx.commit().store()?;
            Ok(ReadReceipt { id, read_at })
        })
    }

    pub fn get_message(&self, id: i64) -> Result<MessageDetail> {
        self.with_conn(|conn| query_message(conn, id))?
            .ok_or_else(|| Error::NotFound(format!("No such message: {}", id)))
    }

    /// Messages sent by `username`, in store order.
    pub fn messages_from(&self, username: &str) -> Result<Vec<SentMessage>> {
        self.with_conn(|conn| query_messages_from(conn, username))
    }

    /// Messages received by `username`, in store order.
    pub fn messages_to(&self, username: &str) -> Result<Vec<ReceivedMessage>> {
        self.with_conn(|conn| query_messages_to(conn, username))
    }
}

/// Read four consecutive columns starting at `at` as an identity snippet.
fn snippet(row: &Row<'_>, at: usize) -> rusqlite::Result<IdentitySnippet> {
    Ok(IdentitySnippet {
        username: row.get(at)?,
        first_name: row.get(at + 1)?,
        last_name: row.get(at + 2)?,
        phone: row.get(at + 3)?,
    })
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageDetail>> {
    conn.query_row(
        "SELECT m.id,
                f.username, f.first_name, f.last_name, f.phone,
                t.username, t.first_name, t.last_name, t.phone,
                m.body, m.sent_at, m.read_at
         FROM messages AS m
         JOIN users AS f ON m.from_username = f.username
         JOIN users AS t ON m.to_username = t.username
         WHERE m.id = ?1",
        [id],
        |row| {
            Ok(MessageDetail {
                id: row.get(0)?,
                from_user: snippet(row, 1)?,
                to_user: snippet(row, 5)?,
                body: row.get(9)?,
                sent_at: row.get(10)?,
                read_at: row.get(11)?,
            })
        },
    )
    .optional()
}

fn query_messages_from(conn: &Connection, username: &str) -> Result<Vec<SentMessage>> {
    // JOIN the recipient so each entry carries its snippet in one query
    let mut stmt = conn
        .prepare(
            "SELECT m.id, u.username, u.first_name, u.last_name, u.phone,
                    m.body, m.sent_at, m.read_at
             FROM messages AS m
             JOIN users AS u ON m.to_username = u.username
             WHERE m.from_username = ?1
             ORDER BY m.id",
        )
        .store()?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(SentMessage {
                id: row.get(0)?,
                to_user: snippet(row, 1)?,
                body: row.get(5)?,
                sent_at: row.get(6)?,
                read_at: row.get(7)?,
            })
        })
        .store()?
        .collect::<std::result::Result<Vec<_>, _>>()
        .store()?;

    Ok(rows)
}

fn query_messages_to(conn: &Connection, username: &str) -> Result<Vec<ReceivedMessage>> {
    let mut stmt = conn
        .prepare(
            "SELECT m.id, u.username, u.first_name, u.last_name, u.phone,
                    m.body, m.sent_at, m.read_at
             FROM messages AS m
             JOIN users AS u ON m.from_username = u.username
             WHERE m.to_username = ?1
             ORDER BY m.id",
        )
        .store()?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(ReceivedMessage {
                id: row.get(0)?,
                from_user: snippet(row, 1)?,
                body: row.get(5)?,
                sent_at: row.get(6)?,
                read_at: row.get(7)?,
            })
        })
        .store()?
        .collect::<std::result::Result<Vec<_>, _>>()
        .store()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn db_with_users(names: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for name in names {
            db.create_user(&NewUser {
                username: name,
                password_hash: "$argon2id$stub",
                first_name: "First",
                last_name: name,
                phone: "555-0100",
            })
            .unwrap();
        }
        db
    }

    fn send(db: &Database, from: &str, to: &str, body: &str) -> Result<Message> {
        db.insert_message(&NewMessage {
            from_username: from,
            to_username: to,
            body,
        })
    }

    #[test]
    fn created_message_is_visible_everywhere() {
        let db = db_with_users(&["alice", "bob"]);
        let msg = send(&db, "alice", "bob", "hi bob").unwrap();
        assert_eq!(msg.read_at, None);

        let detail = db.get_message(msg.id).unwrap();
        assert_eq!(detail.from_user.username, "alice");
        assert_eq!(detail.to_user.username, "bob");
        assert_eq!(detail.to_user.last_name, "bob");
        assert_eq!(detail.body, "hi bob");
        assert_eq!(detail.sent_at, msg.sent_at);
        assert_eq!(detail.read_at, None);
        assert!((Utc::now() - detail.sent_at).num_seconds() < 5);

        let sent = db.messages_from("alice").unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, msg.id);
        assert_eq!(sent[0].to_user.username, "bob");

        let received = db.messages_to("bob").unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].from_user.username, "alice");

        assert!(db.messages_to("alice").unwrap().is_empty());
        assert!(db.messages_from("bob").unwrap().is_empty());
    }

    #[test]
    fn ids_are_monotonic() {
        let db = db_with_users(&["alice", "bob"]);
        let first = send(&db, "alice", "bob", "one").unwrap();
        let second = send(&db, "bob", "alice", "two").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn unknown_recipient_persists_nothing() {
        let db = db_with_users(&["alice"]);

        let err = send(&db, "alice", "ghost", "hello?").unwrap_err();
        assert!(matches!(err, Error::ReferentialViolation(_)));

        let err = send(&db, "ghost", "alice", "boo").unwrap_err();
        assert!(matches!(err, Error::ReferentialViolation(_)));

        assert!(db.messages_from("alice").unwrap().is_empty());
        assert!(db.messages_to("alice").unwrap().is_empty());
    }

    #[test]
    fn mark_read_first_write_wins() {
        let db = db_with_users(&["alice", "bob"]);
        let msg = send(&db, "alice", "bob", "read me").unwrap();

        let first = db.mark_read(msg.id).unwrap();
        assert_eq!(first.id, msg.id);
        assert_eq!(db.get_message(msg.id).unwrap().read_at, Some(first.read_at));

        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = db.mark_read(msg.id).unwrap();
        assert_eq!(second.read_at, first.read_at);
        assert_eq!(db.get_message(msg.id).unwrap().read_at, Some(first.read_at));
    }

    #[test]
    fn missing_message() {
        let db = db_with_users(&[]);
        assert!(matches!(db.get_message(42), Err(Error::NotFound(_))));
        assert!(matches!(db.mark_read(42), Err(Error::NotFound(_))));
    }
}
