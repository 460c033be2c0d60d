use std::sync::{Mutex, MutexGuard, PoisonError};

/// What a toggle on the playback slot did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackToggle {
    /// The message now holds the slot; `released` held it before.
    Acquired { released: Option<String> },
    /// The message was already playing and has been released.
    Released,
}

/// Single-slot owner of the speaker: at most one message is read aloud.
#[derive(Debug, Default)]
pub struct PlaybackSlot {
    current: Mutex<Option<String>>,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Acquire the slot for `message_id`, forcibly releasing any other
    /// holder. Toggling the current holder releases it instead.
    pub fn toggle(&self, message_id: &str) -> PlaybackToggle {
        let mut current = self.lock();
        if current.as_deref() == Some(message_id) {
            *current = None;
            return PlaybackToggle::Released;
        }
        let released = current.replace(message_id.to_string());
        PlaybackToggle::Acquired { released }
    }

    /// Release the slot only if `message_id` still holds it.
    pub fn release(&self, message_id: &str) -> bool {
        let mut current = self.lock();
        if current.as_deref() == Some(message_id) {
            *current = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&self) -> Option<String> {
        self.lock().take()
    }
}
