//! Session Transcript Store
//!
//! Holds the ordered message history of one page session together with the
//! busy flag the render layer uses for its pending-response affordance.
//! Messages are append-only; the only way to drop them is a full reset, which
//! always leaves the locale's greeting as element 0.

use crate::{content::content, locale::Locale};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// One turn in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("User messages must contain text")]
    EmptyUserMessage,
}

/// A point-in-time copy of the store for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptSnapshot {
    pub locale: Locale,
    pub busy: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug)]
pub struct TranscriptStore {
    locale: Locale,
    messages: Vec<Message>,
    busy: bool,
    /// Bumped on every initialize/reset so that replies to a discarded
    /// transcript can be recognised when they settle.
    epoch: u64,
}

impl TranscriptStore {
    /// Creates a store already initialized with `locale`'s greeting.
    pub fn new(locale: Locale) -> Self {
        let mut store = Self {
            locale,
            messages: Vec::new(),
            busy: false,
            epoch: 0,
        };
        store.initialize(locale);
        store
    }

    /// Replaces the transcript with `[greeting(locale)]`.
    ///
    /// The busy flag is left alone: a cycle already in flight still owns it
    /// and clears it when it settles.
    pub fn initialize(&mut self, locale: Locale) {
        self.locale = locale;
        self.messages = vec![Message::model(content(locale).greeting)];
        self.epoch += 1;
    }

    /// User-triggered "new session". Same effect as [`Self::initialize`].
    pub fn reset(&mut self, locale: Locale) {
        self.initialize(locale);
    }

    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        if message.role == Role::User && message.text.trim().is_empty() {
            return Err(TranscriptError::EmptyUserMessage);
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            locale: self.locale,
            busy: self.busy,
            messages: self.messages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_holds_only_the_greeting() {
        let store = TranscriptStore::new(Locale::En);
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0], Message::model(content(Locale::En).greeting));
        assert!(!store.is_busy());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = TranscriptStore::new(Locale::En);
        store.append(Message::user("What is Part 2?")).unwrap();
        store.append(Message::model("A federal rule.")).unwrap();

        let roles: Vec<Role> = store.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(store.messages()[1].text, "What is Part 2?");
    }

    #[test]
    fn test_append_rejects_blank_user_text() {
        let mut store = TranscriptStore::new(Locale::En);
        assert_eq!(
            store.append(Message::user("   ")),
            Err(TranscriptError::EmptyUserMessage)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_locale_change_collapses_to_new_greeting() {
        let mut store = TranscriptStore::new(Locale::En);
        for i in 0..3 {
            store.append(Message::user(format!("q{i}"))).unwrap();
            store.append(Message::model(format!("a{i}"))).unwrap();
        }
        let before = store.epoch();

        store.initialize(Locale::Es);

        assert_eq!(store.len(), 1);
        assert_eq!(store.locale(), Locale::Es);
        assert_eq!(store.messages()[0].text, content(Locale::Es).greeting);
        assert!(store.epoch() > before);
    }

    #[test]
    fn test_reset_matches_locale_change_with_same_locale() {
        let mut reset = TranscriptStore::new(Locale::Es);
        reset.append(Message::user("hola")).unwrap();
        reset.reset(Locale::Es);

        let mut changed = TranscriptStore::new(Locale::En);
        changed.initialize(Locale::Es);

        assert_eq!(reset.messages(), changed.messages());
    }

    #[test]
    fn test_reset_keeps_busy_flag() {
        let mut store = TranscriptStore::new(Locale::En);
        store.set_busy(true);
        store.reset(Locale::En);
        assert!(store.is_busy());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::model("hi")).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"hi"}"#);
        assert_eq!(format!("{}", Role::User), "user");
    }
}
