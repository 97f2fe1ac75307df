//! Keymap source and keyboard focus.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::connection::ClientId;
use crate::connection::mailbox::{MailboxSender, Notice};
use crate::render::{BufferHandle, ReleaseRouter};

const INPUT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::input");

/// Keymap used when none is configured; resolved by the client's xkbcommon.
pub const DEFAULT_KEYMAP: &str = "xkb_keymap {
\txkb_keycodes  { include \"evdev+aliases(qwerty)\" };
\txkb_types     { include \"complete\" };
\txkb_compat    { include \"complete\" };
\txkb_symbols   { include \"pc+us+inet(evdev)\" };
\txkb_geometry  { include \"pc(pc105)\" };
};
";

/// Key repeat rate in characters per second.
pub const REPEAT_RATE: i32 = 25;

/// Delay before key repeat starts, in milliseconds.
pub const REPEAT_DELAY: i32 = 600;

/// Errors raised while loading the keymap.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read keymap {path}: {source}")]
    ReadKeymap {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("keymap {path} is empty")]
    EmptyKeymap { path: Utf8PathBuf },
}

/// Supplier of keyboard configuration sent to clients.
pub trait InputBackend: Send + Sync {
    /// XKB v1 keymap text, without a trailing NUL.
    fn keymap(&self) -> &[u8];

    /// Repeat rate and delay.
    fn repeat_info(&self) -> (i32, i32) {
        (REPEAT_RATE, REPEAT_DELAY)
    }
}

/// A keymap read once at startup.
#[derive(Debug, Clone)]
pub struct StaticKeymap {
    text: Vec<u8>,
}

impl Default for StaticKeymap {
    fn default() -> Self {
        Self {
            text: DEFAULT_KEYMAP.as_bytes().to_vec(),
        }
    }
}

impl StaticKeymap {
    /// Loads `path`, or the built-in keymap when no path is configured.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, InputError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read(path).map_err(|source| InputError::ReadKeymap {
            path: path.to_owned(),
            source,
        })?;
        if text.iter().all(u8::is_ascii_whitespace) {
            return Err(InputError::EmptyKeymap {
                path: path.to_owned(),
            });
        }
        debug!(target: INPUT_TARGET, %path, bytes = text.len(), "loaded keymap");
        Ok(Self { text })
    }
}

impl InputBackend for StaticKeymap {
    fn keymap(&self) -> &[u8] {
        &self.text
    }
}

#[derive(Debug, Default)]
struct SeatState {
    clients: HashMap<ClientId, MailboxSender>,
    focus: Option<ClientId>,
}

/// Live connections and the one holding keyboard focus.
///
/// Focus follows the most recently created toplevel. Notices are delivered
/// through each connection's mailbox, so the seat never touches connection
/// state directly.
#[derive(Debug, Clone, Default)]
pub struct Seat {
    state: Arc<Mutex<SeatState>>,
}

impl Seat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, client: ClientId, mailbox: MailboxSender) {
        self.with_state(|state| {
            state.clients.insert(client, mailbox);
        });
    }

    /// Forgets `client`, dropping focus if it held it.
    pub fn unregister(&self, client: ClientId) {
        self.with_state(|state| {
            state.clients.remove(&client);
            if state.focus == Some(client) {
                state.focus = None;
            }
        });
    }

    /// Moves keyboard focus to `client`.
    ///
    /// The new holder is always notified, even if it already had focus, so
    /// it can move focus to its newest surface.
    pub fn focus(&self, client: ClientId) {
        self.with_state(|state| {
            let previous = state.focus.replace(client);
            if let Some(mailbox) = previous
                .filter(|old| *old != client)
                .and_then(|old| state.clients.get(&old))
            {
                mailbox.post(Notice::Focus(false));
            }
            if let Some(mailbox) = state.clients.get(&client) {
                mailbox.post(Notice::Focus(true));
            }
            debug!(target: INPUT_TARGET, %client, "keyboard focus changed");
        });
    }

    #[must_use]
    pub fn focused(&self) -> Option<ClientId> {
        self.with_state(|state| state.focus)
    }

    /// Delivers a key to the focused connection; `false` when nobody has
    /// focus.
    pub fn key_event(&self, time: u32, key: u32, pressed: bool) -> bool {
        self.with_state(|state| {
            let Some(mailbox) = state.focus.and_then(|client| state.clients.get(&client)) else {
                return false;
            };
            mailbox.post(Notice::Key { time, key, pressed })
        })
    }

    /// Asks every connection to close.
    pub fn shutdown_all(&self) {
        self.with_state(|state| {
            for mailbox in state.clients.values() {
                mailbox.post(Notice::Shutdown);
            }
        });
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.with_state(|state| state.clients.len())
    }

    fn with_state<T>(&self, action: impl FnOnce(&mut SeatState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut state)
    }
}

impl ReleaseRouter for Seat {
    fn buffer_released(&self, handle: BufferHandle) {
        self.with_state(|state| {
            if let Some(mailbox) = state.clients.get(&handle.client) {
                mailbox.post(Notice::BufferReleased(handle));
            }
        });
    }
}
