//! Wiki documents and the typed objects attached to them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::models::DocumentReference;

/// A structured record attached to a document, typed by its class
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XObject {
    /// Local form of the class document, e.g. `IRC.IRCBotListenerClass`
    pub class: String,
    /// Index among the objects of the same class on one document
    pub number: u32,
    pub properties: BTreeMap<String, Value>,
}

impl XObject {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            number: 0,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// String view of a property; absent or structured values read as empty
    pub fn string_value(&self, key: &str) -> String {
        match self.properties.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Integer view of a property; anything unparseable reads as 0
    pub fn int_value(&self, key: &str) -> i64 {
        match self.properties.get(key) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Bool(b)) => i64::from(*b),
            _ => 0,
        }
    }
}

/// A versioned wiki page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub reference: DocumentReference,
    /// Serialized identity of the last editor
    pub author: String,
    /// Edit comment of the current version
    pub comment: String,
    /// Revision identifier, e.g. `2.5`
    pub version: String,
    pub content: String,
    pub objects: Vec<XObject>,
}

impl Document {
    pub fn new(reference: DocumentReference) -> Self {
        Self {
            reference,
            author: String::new(),
            comment: String::new(),
            version: "1.1".to_string(),
            content: String::new(),
            objects: Vec::new(),
        }
    }

    /// First object of the given class
    pub fn object(&self, class: &str) -> Option<&XObject> {
        self.objects.iter().find(|o| o.class == class)
    }

    /// All objects of the given class, in number order
    pub fn objects_of(&self, class: &str) -> Vec<&XObject> {
        let mut objects: Vec<_> = self.objects.iter().filter(|o| o.class == class).collect();
        objects.sort_by_key(|o| o.number);
        objects
    }

    /// Attach an object, numbering it after the existing ones of its class
    pub fn add_object(&mut self, mut object: XObject) {
        object.number = self
            .objects
            .iter()
            .filter(|o| o.class == object.class)
            .map(|o| o.number + 1)
            .max()
            .unwrap_or(0);
        self.objects.push(object);
    }

    /// Absolute URL: `<base>/bin/<action>/<Space>/<Name>[?query]`
    pub fn external_url(
        &self,
        action: &str,
        query: Option<&str>,
        context: &ExecutionContext,
    ) -> Result<String> {
        let mut url = Url::parse(&context.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend([
                "bin",
                action,
                self.reference.space.as_str(),
                self.reference.name.as_str(),
            ]);
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url.to_string())
    }
}
