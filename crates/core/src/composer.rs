//! Notification text
//!
//! One line per change:
//! `<document> was modified by <author> <comment> - <url>`.
//! An empty update comment leaves a double space in the line.

use url::Url;

use crate::context::ActorResolver;
use crate::error::Result;
use crate::models::{ChangeEvent, ChangeKind};

/// A composed notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageComposer;

impl MessageComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(
        &self,
        event: &ChangeEvent,
        actors: &dyn ActorResolver,
    ) -> Result<NotificationMessage> {
        let author = self.author(event, actors)?;
        let comment = self.comment(event);
        let url = self.url(event);

        Ok(NotificationMessage {
            text: format!(
                "{} was modified by {} {} - {}",
                event.document_id, author, comment, url
            ),
            url,
        })
    }

    /// Deletions are reported as the user performing them, not the last editor
    fn author(&self, event: &ChangeEvent, actors: &dyn ActorResolver) -> Result<String> {
        match event.kind {
            ChangeKind::Deleted => actors.current_actor(),
            ChangeKind::Created | ChangeKind::Updated => Ok(event.author.clone()),
        }
    }

    fn comment(&self, event: &ChangeEvent) -> String {
        match event.kind {
            ChangeKind::Deleted => "(deleted)".to_string(),
            ChangeKind::Created if event.comment.is_empty() => "(created)".to_string(),
            ChangeKind::Created => format!("(created) {}", event.comment),
            ChangeKind::Updated => event.comment.clone(),
        }
    }

    fn url(&self, event: &ChangeEvent) -> String {
        match (event.kind, &event.diff_revision) {
            (ChangeKind::Updated, Some(revision)) => diff_url(&event.external_url, revision),
            _ => event.external_url.clone(),
        }
    }
}

/// View URL with the changes viewer pointed at `revision`
fn diff_url(view_url: &str, revision: &str) -> String {
    match Url::parse(view_url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("viewer", "changes")
                .append_pair("rev2", revision);
            url.to_string()
        }
        Err(_) => {
            let separator = if view_url.contains('?') { '&' } else { '?' };
            format!("{}{}viewer=changes&rev2={}", view_url, separator, revision)
        }
    }
}
