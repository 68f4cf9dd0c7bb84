//! Data models for wikirc

mod bot;
mod document;
mod event;
mod reference;

pub use bot::*;
pub use document::*;
pub use event::*;
pub use reference::*;
