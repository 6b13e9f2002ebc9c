//! Keyboard input boundary.
//!
//! The playback loop only sees [`Key`] values through [`KeySource`]; raw
//! terminal events are translated here.

use crate::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::VecDeque;
use std::time::Duration;

/// A key press relevant to playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    /// Ctrl+C, which raw mode delivers as a key instead of a signal
    Interrupt,
}

/// Non-blocking keyboard poll
pub trait KeySource {
    /// Consume at most one pending key without waiting
    fn poll_key(&mut self) -> Result<Option<Key>>;
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn poll_key(&mut self) -> Result<Option<Key>> {
        (**self).poll_key()
    }
}

/// Reads keys from the terminal through crossterm
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl CrosstermKeys {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for CrosstermKeys {
    fn poll_key(&mut self) -> Result<Option<Key>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }

        match event::read()? {
            Event::Key(key_event) => Ok(translate(key_event)),
            _ => Ok(None),
        }
    }
}

/// Map a crossterm key event to a playback key
pub fn translate(key_event: KeyEvent) -> Option<Key> {
    if key_event.kind == KeyEventKind::Release {
        return None;
    }

    match key_event.code {
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Key::Interrupt)
        }
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

/// Key source for sessions without an interactive stdin
#[derive(Debug, Default)]
pub struct NoKeys;

impl KeySource for NoKeys {
    fn poll_key(&mut self) -> Result<Option<Key>> {
        Ok(None)
    }
}

/// Replays a fixed sequence of poll results, then reports no input.
///
/// Each entry is the outcome of one poll, so `None` entries model
/// cycles where no key was pending.
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    polls: VecDeque<Option<Key>>,
}

impl ScriptedKeys {
    pub fn new(polls: impl IntoIterator<Item = Option<Key>>) -> Self {
        Self {
            polls: polls.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.polls.len()
    }
}

impl KeySource for ScriptedKeys {
    fn poll_key(&mut self) -> Result<Option<Key>> {
        Ok(self.polls.pop_front().flatten())
    }
}
