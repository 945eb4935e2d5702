//! Authorization rules for poll management.

use std::collections::HashSet;

use pollbot_types::error::PollError;
use pollbot_types::poll::Poll;

/// Process-wide admin set, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: HashSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self, actor: &str) -> bool {
        self.admins.contains(actor)
    }

    /// Open, close and delete are reserved to the poll's author and admins.
    pub fn can_manage(&self, actor: &str, poll: &Poll) -> bool {
        poll.author == actor || self.is_admin(actor)
    }

    pub fn require_manage(&self, actor: &str, poll: &Poll) -> Result<(), PollError> {
        if self.can_manage(actor, poll) {
            Ok(())
        } else {
            Err(PollError::AccessDenied)
        }
    }

    pub fn require_admin(&self, actor: &str) -> Result<(), PollError> {
        if self.is_admin(actor) {
            Ok(())
        } else {
            Err(PollError::AccessDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn poll_by(author: &str) -> Poll {
        Poll {
            name: "p1".to_string(),
            author: author.to_string(),
            title: "t".to_string(),
            created_at: Utc::now(),
            open: false,
            interim: false,
            anonymous: false,
            options: Vec::new(),
        }
    }

    #[test]
    fn test_author_and_admin_can_manage() {
        let policy = AccessPolicy::new(["Totoro"]);
        let poll = poll_by("alice");

        assert!(policy.can_manage("alice", &poll));
        assert!(policy.can_manage("Totoro", &poll));
        assert!(!policy.can_manage("mallory", &poll));
        assert_eq!(
            policy.require_manage("mallory", &poll),
            Err(PollError::AccessDenied)
        );
    }

    #[test]
    fn test_admin_check_is_exact() {
        let policy = AccessPolicy::new(vec!["Totoro".to_string()]);
        assert!(policy.require_admin("Totoro").is_ok());
        assert!(policy.require_admin("totoro").is_err());
        assert!(!AccessPolicy::default().is_admin("Totoro"));
    }
}
