//! Execution context
//!
//! Every request into the wiki runs on behalf of a user in one wiki. Instead of
//! a thread-bound global, operations that need this information take an
//! [`Execution`] handle explicitly.

use crate::error::{Error, Result};

/// Wiki, URL root and acting user of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Wiki the request runs in
    pub wiki: String,
    /// External URL root, e.g. `https://wiki.example.org/xwiki/`
    pub base_url: String,
    /// Serialized identity of the acting user
    pub user: String,
}

impl ExecutionContext {
    pub fn new(wiki: impl Into<String>, base_url: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            base_url: base_url.into(),
            user: user.into(),
        }
    }
}

/// Handle to the (possibly absent) context of the current call
#[derive(Debug, Clone, Default)]
pub struct Execution {
    context: Option<ExecutionContext>,
}

impl Execution {
    pub fn bound(context: ExecutionContext) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// A call made outside of any request
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Result<&ExecutionContext> {
        self.context.as_ref().ok_or(Error::ContextUnavailable)
    }

    /// Same wiki and URL root, different acting user
    pub fn acting_as(&self, user: impl Into<String>) -> Result<Self> {
        let mut context = self.context()?.clone();
        context.user = user.into();
        Ok(Self::bound(context))
    }
}

/// Resolves who is performing the current action
pub trait ActorResolver {
    fn current_actor(&self) -> Result<String>;
}

impl ActorResolver for Execution {
    fn current_actor(&self) -> Result<String> {
        Ok(self.context()?.user.clone())
    }
}
