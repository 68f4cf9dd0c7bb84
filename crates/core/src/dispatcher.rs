//! Document change notifier
//!
//! Registered on the event bus as `ircdocumentevents`. Each delivered event
//! goes through four gates: connectivity, exclusion, composition, send.
//! Failures past the exclusion gate are logged and dropped; nothing
//! propagates back to the bus.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::chat::ChatClient;
use crate::composer::{MessageComposer, NotificationMessage};
use crate::constants::DOCUMENT_EVENTS_LISTENER;
use crate::context::Execution;
use crate::error::{Error, Result};
use crate::filter::SharedExclusionFilter;
use crate::models::{ChangeEvent, ChangeKind, Document, EventSource};
use crate::observation::EventListener;

/// What happened to one delivered event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Chat client offline
    Offline,
    /// Payload was not a document
    Ignored,
    /// Document matched an exclusion pattern
    Excluded,
    /// Composition or send failed; already logged
    Failed,
    Sent { channel: String },
}

pub struct NotificationDispatcher<C: ?Sized> {
    filter: Arc<SharedExclusionFilter>,
    composer: MessageComposer,
    client: Arc<C>,
}

impl<C: ChatClient + ?Sized> NotificationDispatcher<C> {
    pub fn new(filter: Arc<SharedExclusionFilter>, composer: MessageComposer, client: Arc<C>) -> Self {
        Self {
            filter,
            composer,
            client,
        }
    }

    pub fn filter(&self) -> &Arc<SharedExclusionFilter> {
        &self.filter
    }

    /// Run one event through the pipeline
    pub fn handle(&self, kind: ChangeKind, source: &EventSource, execution: &Execution) -> DispatchOutcome {
        if !self.client.is_connected() {
            return DispatchOutcome::Offline;
        }
        let Some(document) = source.as_document() else {
            return DispatchOutcome::Ignored;
        };

        let document_id = document.reference.local();
        if self.filter.should_suppress(&document_id) {
            debug!(document = %document_id, "Notification excluded");
            return DispatchOutcome::Excluded;
        }

        let message = match self.compose(kind, document, execution) {
            Ok(message) => message,
            Err(e) => {
                error!(
                    document = %document_id,
                    kind = %kind,
                    error = %e,
                    "Failed to send IRC notification for document [{}]",
                    document_id
                );
                return DispatchOutcome::Failed;
            }
        };

        match self.send(&document_id, &message) {
            Ok(channel) => {
                debug!(document = %document_id, channel = %channel, "Notification queued");
                DispatchOutcome::Sent { channel }
            }
            Err(e) => {
                warn!(document = %document_id, error = %e, "Dropping IRC notification");
                DispatchOutcome::Failed
            }
        }
    }

    fn compose(&self, kind: ChangeKind, document: &Document, execution: &Execution) -> Result<NotificationMessage> {
        let event = ChangeEvent::from_document(kind, document, execution.context()?)?;
        self.composer.compose(&event, execution)
    }

    /// Only the first joined channel is notified
    fn send(&self, document_id: &str, message: &NotificationMessage) -> Result<String> {
        let channel = self
            .client
            .channel_names()
            .into_iter()
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::DispatchFailure {
                document: document_id.to_string(),
                reason: "bot has not joined any channel".to_string(),
            })?;

        self.client
            .send_message(&channel, &message.text)
            .map_err(|e| Error::DispatchFailure {
                document: document_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(channel)
    }
}

impl<C: ChatClient + ?Sized> EventListener for NotificationDispatcher<C> {
    fn name(&self) -> &str {
        DOCUMENT_EVENTS_LISTENER
    }

    fn events(&self) -> &[ChangeKind] {
        &ChangeKind::ALL
    }

    fn on_event(&self, kind: ChangeKind, source: &EventSource, execution: &Execution) {
        self.handle(kind, source, execution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::context::ExecutionContext;
    use crate::filter::ExclusionFilter;
    use crate::models::DocumentReference;

    #[derive(Default)]
    struct RecordingChatClient {
        connected: bool,
        channels: Vec<String>,
        fail_sends: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingChatClient {
        fn online(channels: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                connected: true,
                channels: channels.iter().map(|c| c.to_string()).collect(),
                ..Self::default()
            })
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ChatClient for RecordingChatClient {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn channel_names(&self) -> Vec<String> {
            self.channels.clone()
        }

        fn send_message(&self, channel: &str, text: &str) -> Result<()> {
            if self.fail_sends {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "connection reset",
                )));
            }
            self.sent
                .lock()
                .unwrap()
                .push((channel.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn dispatcher(client: Arc<RecordingChatClient>, patterns: &[&str]) -> NotificationDispatcher<RecordingChatClient> {
        let filter = ExclusionFilter::compile(patterns.iter().copied()).unwrap();
        NotificationDispatcher::new(
            Arc::new(SharedExclusionFilter::new(filter)),
            MessageComposer::new(),
            client,
        )
    }

    fn web_home() -> EventSource {
        let mut doc = Document::new(DocumentReference::new("xwiki", "Main", "WebHome"));
        doc.author = "alice".to_string();
        doc.comment = "added section".to_string();
        doc.version = "2.5".to_string();
        EventSource::Document(doc)
    }

    fn acting(user: &str) -> Execution {
        Execution::bound(ExecutionContext::new("xwiki", "http://localhost:8080/xwiki/", user))
    }

    #[test]
    fn test_update_is_sent_to_channel() {
        let client = RecordingChatClient::online(&["#wiki"]);
        let dispatcher = dispatcher(client.clone(), &[]);

        let outcome = dispatcher.handle(ChangeKind::Updated, &web_home(), &acting("bob"));
        assert_eq!(outcome, DispatchOutcome::Sent { channel: "#wiki".to_string() });

        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "#wiki");
        assert_eq!(
            sent[0].1,
            "Main.WebHome was modified by alice added section - \
             http://localhost:8080/xwiki/bin/view/Main/WebHome?viewer=changes&rev2=2.5"
        );
    }

    #[test]
    fn test_excluded_document_is_not_sent() {
        let client = RecordingChatClient::online(&["#wiki"]);
        let dispatcher = dispatcher(client.clone(), &["^Main\\..*"]);

        let outcome = dispatcher.handle(ChangeKind::Updated, &web_home(), &acting("bob"));
        assert_eq!(outcome, DispatchOutcome::Excluded);
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_offline_drops_everything() {
        let client = Arc::new(RecordingChatClient {
            channels: vec!["#wiki".to_string()],
            ..RecordingChatClient::default()
        });
        let dispatcher = dispatcher(client.clone(), &[]);

        for kind in ChangeKind::ALL {
            assert_eq!(dispatcher.handle(kind, &web_home(), &acting("bob")), DispatchOutcome::Offline);
        }
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_non_document_payload_is_ignored() {
        let client = RecordingChatClient::online(&["#wiki"]);
        let dispatcher = dispatcher(client.clone(), &[]);

        let source = EventSource::Other("attachment".to_string());
        assert_eq!(
            dispatcher.handle(ChangeKind::Created, &source, &acting("bob")),
            DispatchOutcome::Ignored
        );
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_delete_reports_acting_user() {
        let client = RecordingChatClient::online(&["#wiki"]);
        let dispatcher = dispatcher(client.clone(), &[]);

        dispatcher.handle(ChangeKind::Deleted, &web_home(), &acting("XWiki.bob"));
        let sent = client.sent();
        assert_eq!(
            sent[0].1,
            "Main.WebHome was modified by XWiki.bob (deleted) - \
             http://localhost:8080/xwiki/bin/view/Main/WebHome"
        );
    }

    #[test]
    fn test_composition_failure_is_contained() {
        let client = RecordingChatClient::online(&["#wiki"]);
        let dispatcher = dispatcher(client.clone(), &[]);

        let outcome = dispatcher.handle(ChangeKind::Deleted, &web_home(), &Execution::unbound());
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_only_first_channel_is_notified() {
        let client = RecordingChatClient::online(&["#wiki", "#ops"]);
        let dispatcher = dispatcher(client.clone(), &[]);

        dispatcher.handle(ChangeKind::Created, &web_home(), &acting("bob"));
        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "#wiki");
    }

    #[test]
    fn test_send_failures_are_dropped() {
        let client = Arc::new(RecordingChatClient {
            connected: true,
            channels: vec!["#wiki".to_string()],
            fail_sends: true,
            ..RecordingChatClient::default()
        });
        let dispatcher = dispatcher(client.clone(), &[]);
        assert_eq!(
            dispatcher.handle(ChangeKind::Created, &web_home(), &acting("bob")),
            DispatchOutcome::Failed
        );

        let no_channels = RecordingChatClient::online(&[]);
        let dispatcher = self::dispatcher(no_channels, &[]);
        assert_eq!(
            dispatcher.handle(ChangeKind::Created, &web_home(), &acting("bob")),
            DispatchOutcome::Failed
        );
    }

    #[test]
    fn test_reloaded_patterns_apply_to_next_event() {
        let client = RecordingChatClient::online(&["#wiki"]);
        let dispatcher = dispatcher(client.clone(), &[]);

        dispatcher
            .filter()
            .replace(ExclusionFilter::compile(["Main\\.WebHome"]).unwrap());
        assert_eq!(
            dispatcher.handle(ChangeKind::Updated, &web_home(), &acting("bob")),
            DispatchOutcome::Excluded
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.text()
    }

    #[test]
    fn test_excluded_and_offline_events_log_no_errors() {
        let logs = with_captured_logs(|| {
            let online = RecordingChatClient::online(&["#wiki"]);
            let excluding = dispatcher(online.clone(), &["^Main\\..*"]);
            assert_eq!(
                excluding.handle(ChangeKind::Updated, &web_home(), &acting("bob")),
                DispatchOutcome::Excluded
            );

            let offline = dispatcher(Arc::new(RecordingChatClient::default()), &[]);
            for kind in ChangeKind::ALL {
                assert_eq!(offline.handle(kind, &web_home(), &acting("bob")), DispatchOutcome::Offline);
            }
            assert!(online.sent().is_empty());
        });

        assert!(logs.contains("Notification excluded"), "{}", logs);
        assert!(!logs.contains("ERROR"), "{}", logs);
        assert!(!logs.contains("WARN"), "{}", logs);
    }

    #[test]
    fn test_composition_failure_is_logged_as_error() {
        let logs = with_captured_logs(|| {
            let dispatcher = dispatcher(RecordingChatClient::online(&["#wiki"]), &[]);
            dispatcher.handle(ChangeKind::Deleted, &web_home(), &Execution::unbound());
        });

        assert!(logs.contains("ERROR"), "{}", logs);
        assert!(logs.contains("Failed to send IRC notification for document [Main.WebHome]"), "{}", logs);
    }

    #[test]
    fn test_listener_identity() {
        let dispatcher = dispatcher(RecordingChatClient::online(&["#wiki"]), &[]);
        assert_eq!(dispatcher.name(), "ircdocumentevents");
        assert_eq!(dispatcher.events(), &ChangeKind::ALL);
    }
}
