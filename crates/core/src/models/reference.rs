//! Document references
//!
//! A document lives at `wiki:Space.Name`. Three serializations are used:
//! the full form, the local form (`Space.Name`) and the compact form which
//! drops the wiki only when it matches the wiki the reader is in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Location of a document in the wiki farm
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentReference {
    pub wiki: String,
    pub space: String,
    pub name: String,
}

impl DocumentReference {
    pub fn new(wiki: impl Into<String>, space: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            space: space.into(),
            name: name.into(),
        }
    }

    /// `wiki:Space.Name`
    pub fn serialize(&self) -> String {
        format!("{}:{}", self.wiki, self.local())
    }

    /// `Space.Name`
    pub fn local(&self) -> String {
        local_form(&self.space, &self.name)
    }

    /// Local form when the document belongs to `current_wiki`, full form otherwise
    pub fn compact(&self, current_wiki: &str) -> String {
        if self.wiki == current_wiki {
            self.local()
        } else {
            self.serialize()
        }
    }

    /// Parse `wiki:Space.Name` or `Space.Name`, resolving a missing wiki to `default_wiki`
    pub fn parse(input: &str, default_wiki: &str) -> Result<Self> {
        let (wiki, rest) = match input.split_once(':') {
            Some((wiki, rest)) if !wiki.is_empty() => (wiki, rest),
            Some(_) => return Err(Error::InvalidReference(input.to_string())),
            None => (default_wiki, input),
        };

        let (space, name) = split_local(rest)
            .ok_or_else(|| Error::InvalidReference(input.to_string()))?;

        Ok(Self::new(wiki, space, name))
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Join a space and page name, escaping dots inside either part
pub fn local_form(space: &str, name: &str) -> String {
    format!("{}.{}", escape(space), escape(name))
}

fn escape(part: &str) -> String {
    part.replace('\\', "\\\\").replace('.', "\\.")
}

/// Split on the first unescaped dot, unescaping both halves
fn split_local(input: &str) -> Option<(String, String)> {
    let mut space = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => space.push(chars.next()?),
            '.' => {
                let mut name = String::new();
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        name.push(chars.next()?);
                    } else {
                        name.push(c);
                    }
                }
                if space.is_empty() || name.is_empty() {
                    return None;
                }
                return Some((space, name));
            }
            c => space.push(c),
        }
    }

    None
}
