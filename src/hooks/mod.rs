//! Event hooks fired by the transport at request/response lifecycle points.
//!
//! Hooks are registered per event name in a [`HookRegistry`]. Before each
//! dispatch the global and per-call registries are combined with
//! [`merge_hooks`] into a [`MergedHooks`], where every event maps to a list.

mod merge;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::{Request, Response};

pub use merge::merge_hooks;

/// What a hook is invoked with.
pub enum HookPayload<'a> {
    /// The outgoing request, after auth has been applied.
    Request(&'a Request),
    /// The response about to be returned to the caller.
    Response(&'a Response),
}

/// Lifecycle points the transport knows how to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Request,
    Response,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::Request => "request",
            HookEvent::Response => "response",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(HookEvent::Request),
            "response" => Ok(HookEvent::Response),
            other => anyhow::bail!("Unsupported hook event '{}'", other),
        }
    }
}

type Callback = dyn Fn(&HookPayload<'_>) + Send + Sync;

/// A shared callback. Two hooks are equal when they share the same callback.
#[derive(Clone)]
pub struct Hook {
    name: Option<String>,
    callback: Arc<Callback>,
}

impl Hook {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&HookPayload<'_>) + Send + Sync + 'static,
    {
        Self {
            name: None,
            callback: Arc::new(callback),
        }
    }

    /// Same as [`Hook::new`], with a label that shows up in `Debug` output and logs.
    pub fn named<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&HookPayload<'_>) + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            callback: Arc::new(callback),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn call(&self, payload: &HookPayload<'_>) {
        (self.callback)(payload)
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl Eq for Hook {}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name.as_deref().unwrap_or("<anonymous>"))
            .finish()
    }
}

/// A registry value: one hook or an ordered list of hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum HookValue {
    Single(Hook),
    Many(Vec<Hook>),
}

impl HookValue {
    /// Hooks in order, regardless of shape.
    pub fn hooks(&self) -> &[Hook] {
        match self {
            HookValue::Single(hook) => std::slice::from_ref(hook),
            HookValue::Many(hooks) => hooks,
        }
    }
}

impl From<Hook> for HookValue {
    fn from(hook: Hook) -> Self {
        HookValue::Single(hook)
    }
}

impl From<Vec<Hook>> for HookValue {
    fn from(hooks: Vec<Hook>) -> Self {
        HookValue::Many(hooks)
    }
}

/// Event name -> hook or list of hooks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookRegistry {
    entries: HashMap<String, HookValue>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, event: impl Into<String>, value: impl Into<HookValue>) -> Self {
        self.insert(event, value);
        self
    }

    /// Sets the value for `event`, replacing whatever was there.
    pub fn insert(&mut self, event: impl Into<String>, value: impl Into<HookValue>) {
        self.entries.insert(event.into(), value.into());
    }

    pub fn get(&self, event: &str) -> Option<&HookValue> {
        self.entries.get(event)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HookValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of [`merge_hooks`]: every event maps to a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedHooks {
    entries: HashMap<String, Vec<Hook>>,
}

impl MergedHooks {
    /// Hooks registered for `event`, empty if none.
    pub fn get(&self, event: &str) -> &[Hook] {
        self.entries.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, event: &str) -> bool {
        self.entries.contains_key(event)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Calls every hook registered for `event`, in order.
    pub fn dispatch(&self, event: HookEvent, payload: &HookPayload<'_>) {
        for hook in self.get(event.as_str()) {
            hook.call(payload);
        }
    }

    pub(crate) fn entry(&mut self, event: &str) -> Option<&mut Vec<Hook>> {
        self.entries.get_mut(event)
    }

    pub(crate) fn insert(&mut self, event: String, hooks: Vec<Hook>) {
        self.entries.insert(event, hooks);
    }
}
