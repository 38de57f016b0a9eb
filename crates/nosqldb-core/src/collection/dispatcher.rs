//! The per-collection request queue and its dedicated dispatcher thread
//! (spec §5).
//!
//! Every request destined for a collection's engine is wrapped in a
//! [`Command`] carrying a one-shot reply channel, sent over an unbounded
//! `crossbeam_channel`, and drained in arrival order by exactly one thread.
//! This gives the engine single-writer semantics without an internal lock:
//! file I/O, seek position, and the in-memory index table are only ever
//! touched from the dispatcher thread.

use crate::collection::engine::Engine;
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender};
use serde_json::Value;

/// One request queued for a collection's dispatcher thread.
pub enum Command {
    /// `Engine::write`.
    Write {
        data: String,
        reply: Sender<Result<String>>,
    },
    /// `Engine::read`.
    Read {
        data: String,
        reply: Sender<Result<Vec<Value>>>,
    },
    /// `Engine::update`.
    Update {
        user_id: String,
        patch: String,
        reply: Sender<Result<Value>>,
    },
    /// `Engine::delete`.
    Delete {
        data: String,
        reply: Sender<Result<usize>>,
    },
    /// `Engine::list_ids`.
    ListIds { reply: Sender<Result<Vec<String>>> },
    /// Stop processing further requests; the thread exits after this.
    Shutdown,
}

/// Drains `receiver` until [`Command::Shutdown`] or the channel is
/// disconnected, running each command to completion before taking the next.
///
/// Runs on the dedicated thread spawned by [`crate::collection::handle::spawn`].
pub fn run(mut engine: Engine, receiver: Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        let poisoned = match command {
            Command::Write { data, reply } => {
                let result = engine.write(&data);
                let poisoned = is_fatal(&result);
                let _ = reply.send(result);
                poisoned
            }
            Command::Read { data, reply } => {
                let result = engine.read(&data);
                let poisoned = is_fatal(&result);
                let _ = reply.send(result);
                poisoned
            }
            Command::Update {
                user_id,
                patch,
                reply,
            } => {
                let result = engine.update(&user_id, &patch);
                let poisoned = is_fatal(&result);
                let _ = reply.send(result);
                poisoned
            }
            Command::Delete { data, reply } => {
                let result = engine.delete(&data);
                let poisoned = is_fatal(&result);
                let _ = reply.send(result);
                poisoned
            }
            Command::ListIds { reply } => {
                let _ = reply.send(Ok(engine.list_ids()));
                false
            }
            Command::Shutdown => break,
        };
        // Corruption is fatal (spec §7): refuse every subsequent request
        // rather than keep operating on a collection whose on-disk state
        // cannot be trusted. Once this thread exits, further sends on the
        // command channel fail and callers see `Error::Closed`.
        if poisoned {
            break;
        }
    }
    tracing::debug!("dispatcher thread exiting");
}

fn is_fatal<T>(result: &Result<T>) -> bool {
    match result {
        Err(err) if !err.is_recoverable() => {
            tracing::error!(code = err.code(), "unrecoverable collection error: {err}");
            true
        }
        _ => false,
    }
}

/// Waits for a one-shot reply, translating a disconnected channel (the
/// dispatcher thread died or already shut down) into [`Error::Closed`].
pub(crate) fn await_reply<T>(collection: &str, receiver: Receiver<Result<T>>) -> Result<T> {
    receiver
        .recv()
        .map_err(|_| Error::Closed(collection.to_string()))?
}
