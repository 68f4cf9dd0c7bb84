//! Names of the wiki pages, classes and properties the bot reads

/// Space holding the bot pages
pub const SPACE: &str = "IRC";

/// Page carrying the bot configuration object
pub const CONFIGURATION_PAGE: &str = "IRCConfiguration";

pub const WIKI_BOT_CONFIGURATION_CLASS: &str = "IRC.IRCBotConfigurationClass";
pub const WIKI_BOT_LISTENER_CLASS: &str = "IRC.IRCBotListenerClass";
pub const EVENT_LISTENER_CONFIGURATION_CLASS: &str = "IRC.IRCEventListenerConfigurationClass";

// IRC.IRCBotConfigurationClass
pub const BOTNAME_PROPERTY: &str = "botname";
pub const SERVER_PROPERTY: &str = "server";
pub const PASSWORD_PROPERTY: &str = "password";
pub const CHANNEL_PROPERTY: &str = "channel";
pub const INACTIVE_PROPERTY: &str = "inactive";

// IRC.IRCBotListenerClass
pub const NAME_PROPERTY: &str = "name";
pub const DESCRIPTION_PROPERTY: &str = "description";

// IRC.IRCEventListenerConfigurationClass, one pattern per line
pub const EXCLUSION_PATTERNS_PROPERTY: &str = "exclusionPatterns";

/// Name the document notifier registers under on the event bus
pub const DOCUMENT_EVENTS_LISTENER: &str = "ircdocumentevents";
