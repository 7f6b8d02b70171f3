//! Authorization decisions. Everything here is pure: callers fetch the
//! entity first and ask whether the acting user may touch it.

use courier_types::error::{Error, Result};
use courier_types::models::MessageDetail;
use tracing::debug;

/// Something an authenticated user wants to do.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Read a message in full.
    ViewMessage(&'a MessageDetail),
    /// Set a message's read timestamp.
    MarkRead(&'a MessageDetail),
    /// See a user's own profile or message lists.
    ActAs(&'a str),
    SendMessage,
    ListUsers,
}

/// `Ok(())` when `actor` may perform `action`, `Forbidden` otherwise.
pub fn authorize(actor: &str, action: Action<'_>) -> Result<()> {
    let allowed = match action {
        Action::ViewMessage(msg) => actor == msg.from_username() || actor == msg.to_username(),
        Action::MarkRead(msg) => actor == msg.to_username(),
        Action::ActAs(target) => actor == target,
        // No block lists: anyone signed in can message anyone and see who exists
        Action::SendMessage | Action::ListUsers => true,
    };

    if allowed {
        Ok(())
    } else {
        debug!("Denied {:?} for {}", action, actor);
        Err(Error::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_types::models::IdentitySnippet;

    fn snippet(username: &str) -> IdentitySnippet {
        IdentitySnippet {
            username: username.into(),
            first_name: "F".into(),
            last_name: "L".into(),
            phone: "0".into(),
        }
    }

    fn message(from: &str, to: &str) -> MessageDetail {
        MessageDetail {
            id: 1,
            from_user: snippet(from),
            to_user: snippet(to),
            body: "hi".into(),
            sent_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn only_parties_view_a_message() {
        let msg = message("alice", "bob");
        assert_eq!(authorize("alice", Action::ViewMessage(&msg)), Ok(()));
        assert_eq!(authorize("bob", Action::ViewMessage(&msg)), Ok(()));
        assert_eq!(
            authorize("carol", Action::ViewMessage(&msg)),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn only_recipient_marks_read() {
        let msg = message("alice", "bob");
        assert_eq!(authorize("bob", Action::MarkRead(&msg)), Ok(()));
        assert_eq!(authorize("alice", Action::MarkRead(&msg)), Err(Error::Forbidden));
        assert_eq!(authorize("carol", Action::MarkRead(&msg)), Err(Error::Forbidden));
    }

    #[test]
    fn self_message_is_fully_owned() {
        let msg = message("alice", "alice");
        assert_eq!(authorize("alice", Action::ViewMessage(&msg)), Ok(()));
        assert_eq!(authorize("alice", Action::MarkRead(&msg)), Ok(()));
    }

    #[test]
    fn act_as_requires_same_user() {
        assert_eq!(authorize("alice", Action::ActAs("alice")), Ok(()));
        assert_eq!(authorize("alice", Action::ActAs("bob")), Err(Error::Forbidden));
        assert_eq!(authorize("alice", Action::ActAs("Alice")), Err(Error::Forbidden));
    }

    #[test]
    fn open_actions() {
        assert_eq!(authorize("anyone", Action::SendMessage), Ok(()));
        assert_eq!(authorize("anyone", Action::ListUsers), Ok(()));
    }
}
