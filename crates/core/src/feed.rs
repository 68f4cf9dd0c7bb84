//! Change feed over the document journal
//!
//! Tails `document_events` with a cursor and replays each entry on the event
//! bus as if the acting user had just performed it.

use crate::context::Execution;
use crate::error::Result;
use crate::models::EventSource;
use crate::observation::ObservationManager;
use crate::storage::{Database, JournalEntry};

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    cursor: i64,
    batch_size: u32,
}

impl ChangeFeed {
    pub fn new(cursor: i64, batch_size: u32) -> Self {
        Self {
            cursor,
            batch_size: batch_size.max(1),
        }
    }

    /// Start after the newest journaled change; history is not replayed
    pub fn tail(db: &Database, batch_size: u32) -> Result<Self> {
        Ok(Self::new(db.journal().latest_seq()?, batch_size))
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Next batch of entries; advances the cursor past them
    pub fn poll(&mut self, db: &Database) -> Result<Vec<JournalEntry>> {
        let entries = db.journal().after(self.cursor, self.batch_size)?;
        if let Some(last) = entries.last() {
            self.cursor = last.seq;
            tracing::debug!(count = entries.len(), cursor = self.cursor, "Polled change feed");
        }
        Ok(entries)
    }
}

/// Deliver journal entries to the bus, each under its own actor
pub fn publish(bus: &ObservationManager, entries: Vec<JournalEntry>, base: &Execution) -> Result<usize> {
    let mut delivered = 0;
    for entry in entries {
        let execution = base.acting_as(entry.actor.as_str())?;
        bus.notify(entry.kind, &EventSource::Document(entry.document), &execution);
        delivered += 1;
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::context::ExecutionContext;
    use crate::models::{ChangeKind, Document, DocumentReference};
    use crate::observation::EventListener;

    #[derive(Default)]
    struct Collector {
        seen: Mutex<Vec<(ChangeKind, String, String)>>,
    }

    impl EventListener for Collector {
        fn name(&self) -> &str {
            "collector"
        }

        fn events(&self) -> &[ChangeKind] {
            &ChangeKind::ALL
        }

        fn on_event(&self, kind: ChangeKind, source: &EventSource, execution: &Execution) {
            let document = source.as_document().map(|d| d.reference.local()).unwrap_or_default();
            let actor = execution.context().map(|c| c.user.clone()).unwrap_or_default();
            self.seen.lock().unwrap().push((kind, document, actor));
        }
    }

    fn base() -> Execution {
        Execution::bound(ExecutionContext::new("xwiki", "http://localhost/xwiki/", "XWiki.IRCBot"))
    }

    #[test]
    fn test_tail_skips_history() {
        let db = Database::open_in_memory().unwrap();
        let doc = Document::new(DocumentReference::new("xwiki", "Main", "Old"));
        db.documents().save(&doc, "", "XWiki.alice").unwrap();

        let mut feed = ChangeFeed::tail(&db, 10).unwrap();
        assert!(feed.poll(&db).unwrap().is_empty());

        let doc = Document::new(DocumentReference::new("xwiki", "Main", "New"));
        db.documents().save(&doc, "", "XWiki.alice").unwrap();
        let entries = feed.poll(&db).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].document.reference.name, "New");
        assert!(feed.poll(&db).unwrap().is_empty());
    }

    #[test]
    fn test_batches_advance_cursor() {
        let db = Database::open_in_memory().unwrap();
        let mut feed = ChangeFeed::new(0, 2);
        for name in ["A", "B", "C"] {
            let doc = Document::new(DocumentReference::new("xwiki", "Main", name));
            db.documents().save(&doc, "", "XWiki.alice").unwrap();
        }

        assert_eq!(feed.poll(&db).unwrap().len(), 2);
        assert_eq!(feed.poll(&db).unwrap().len(), 1);
        assert_eq!(feed.cursor(), db.journal().latest_seq().unwrap());
    }

    #[test]
    fn test_publish_acts_as_journaled_user() {
        let db = Database::open_in_memory().unwrap();
        let bus = ObservationManager::new();
        let collector = Arc::new(Collector::default());
        bus.add_listener(collector.clone());

        let mut feed = ChangeFeed::new(0, 10);
        let reference = DocumentReference::new("xwiki", "Main", "WebHome");
        db.documents()
            .save(&Document::new(reference.clone()), "", "XWiki.alice")
            .unwrap();
        db.documents().delete(&reference, "XWiki.bob").unwrap();

        let delivered = publish(&bus, feed.poll(&db).unwrap(), &base()).unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(
            *collector.seen.lock().unwrap(),
            vec![
                (ChangeKind::Created, "Main.WebHome".to_string(), "XWiki.alice".to_string()),
                (ChangeKind::Deleted, "Main.WebHome".to_string(), "XWiki.bob".to_string()),
            ]
        );
    }

    #[test]
    fn test_publish_needs_context() {
        let db = Database::open_in_memory().unwrap();
        let doc = Document::new(DocumentReference::new("xwiki", "Main", "WebHome"));
        db.documents().save(&doc, "", "XWiki.alice").unwrap();

        let entries = ChangeFeed::new(0, 10).poll(&db).unwrap();
        assert!(publish(&ObservationManager::new(), entries, &Execution::unbound()).is_err());
    }
}
