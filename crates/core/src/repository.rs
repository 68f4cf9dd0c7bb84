//! Wiki-backed bot configuration
//!
//! Bot settings and listener declarations are ordinary wiki objects so that
//! administrators edit them like any other page. This repository turns those
//! objects into typed values. Nothing is cached: each load re-reads storage.

use tracing::{debug, instrument};

use crate::constants::*;
use crate::context::{Execution, ExecutionContext};
use crate::error::{Error, Result};
use crate::models::{local_form, BotData, BotListenerData, Document, DocumentReference};
use crate::storage::{Column, DocumentStore, ObjectQuery, QueryExecutor};

pub struct ConfigRepository<S> {
    store: S,
}

impl<S: DocumentStore + QueryExecutor> ConfigRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Context of the current call; absent context is an environment bug
    pub fn current_context<'e>(&self, execution: &'e Execution) -> Result<&'e ExecutionContext> {
        execution.context()
    }

    /// Load a document, naming it in the error on failure
    pub fn get_document(&self, reference: &DocumentReference) -> Result<Document> {
        self.store
            .get_document(reference)
            .map_err(|e| Error::storage(reference.serialize(), e))
    }

    /// `IRC.IRCConfiguration` in the current wiki
    pub fn configuration_reference(&self, execution: &Execution) -> Result<DocumentReference> {
        let context = self.current_context(execution)?;
        Ok(DocumentReference::new(
            context.wiki.as_str(),
            SPACE,
            CONFIGURATION_PAGE,
        ))
    }

    pub fn configuration_document(&self, execution: &Execution) -> Result<Document> {
        self.get_document(&self.configuration_reference(execution)?)
    }

    /// Read the bot connection identity from the configuration page
    #[instrument(skip_all)]
    pub fn load_bot_data(&self, execution: &Execution) -> Result<BotData> {
        let context = self.current_context(execution)?;
        let reference = self.configuration_reference(execution)?;
        let document = self.get_document(&reference).map_err(|e| Error::ConfigurationMissing {
            message: format!(
                "Cannot load IRC Bot Configuration document [{}]",
                reference.compact(&context.wiki)
            ),
            source: Some(Box::new(e)),
        })?;

        let Some(object) = document.object(WIKI_BOT_CONFIGURATION_CLASS) else {
            return Err(Error::configuration_missing(format!(
                "Cannot find IRC Bot Configuration object in [{}] document",
                document.reference.compact(&context.wiki)
            )));
        };

        let bot_data = BotData {
            name: object.string_value(BOTNAME_PROPERTY),
            server: object.string_value(SERVER_PROPERTY),
            password: object.string_value(PASSWORD_PROPERTY),
            channel: object.string_value(CHANNEL_PROPERTY),
            auto_connect: object.int_value(INACTIVE_PROPERTY) != 1,
        };

        debug!(bot = %bot_data.name, server = %bot_data.server, "Loaded bot configuration");
        Ok(bot_data)
    }

    /// Exclusion patterns stored on the configuration page, one per line.
    /// No listener configuration object means no patterns.
    #[instrument(skip_all)]
    pub fn load_exclusion_patterns(&self, execution: &Execution) -> Result<Vec<String>> {
        let document = self.configuration_document(execution)?;

        Ok(document
            .objects_of(EVENT_LISTENER_CONFIGURATION_CLASS)
            .into_iter()
            .flat_map(|o| {
                o.string_value(EXCLUSION_PATTERNS_PROPERTY)
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    /// Scan the wiki for listener declarations
    #[instrument(skip_all)]
    pub fn load_listener_registry(&self, execution: &Execution) -> Result<Vec<BotListenerData>> {
        let context = self.current_context(execution)?;
        let query = ObjectQuery::objects_of(WIKI_BOT_LISTENER_CLASS)
            .alias("listener")
            .select(Column::Space)
            .select(Column::DocumentName)
            .select_property(NAME_PROPERTY)
            .select_property(DESCRIPTION_PROPERTY)
            .distinct()
            .in_wiki(context.wiki.as_str());

        let rows = self
            .store
            .execute(&query)
            .map_err(|e| Error::query("Failed to locate IRC Bot listener objects in the wiki", e))?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let [space, name, listener_name, listener_description] = <[String; 4]>::try_from(row)
                .map_err(|row| Error::QueryFailure {
                    message: format!("Expected 4 columns per listener row, got {}", row.len()),
                    source: None,
                })?;

            data.push(BotListenerData::wiki_defined(
                local_form(&space, &name),
                listener_name,
                listener_description,
            ));
        }

        debug!(count = data.len(), "Loaded wiki bot listeners");
        Ok(data)
    }
}
