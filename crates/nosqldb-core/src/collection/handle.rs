//! A cloneable front-end handle to a collection's dispatcher thread.

use crate::collection::dispatcher::{self, Command};
use crate::collection::engine::Engine;
use crate::error::Result;
use crossbeam_channel::Sender;
use serde_json::Value;
use std::sync::Arc;

/// A cheap-to-clone reference to a running collection.
///
/// Every method enqueues a [`Command`] and blocks on a one-shot reply,
/// matching the request/response shape of the original channel-based
/// server: the caller's thread suspends only at the queue boundary, never
/// mid-operation.
#[derive(Clone)]
pub struct CollectionHandle {
    name: Arc<str>,
    commands: Sender<Command>,
}

impl CollectionHandle {
    /// Spawns the dispatcher thread owning `engine` and returns a handle to
    /// it.
    #[must_use]
    pub fn spawn(name: impl Into<Arc<str>>, engine: Engine) -> Self {
        let name = name.into();
        let (tx, rx) = crossbeam_channel::unbounded();
        let thread_name = format!("nosqldb-{name}");
        std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || dispatcher::run(engine, rx))
            .expect("failed to spawn collection dispatcher thread");
        Self {
            name,
            commands: tx,
        }
    }

    /// The collection's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `data`, assigning an id if it has none. Returns the user id.
    pub fn write(&self, data: &str) -> Result<String> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(Command::Write {
            data: data.to_string(),
            reply,
        })?;
        dispatcher::await_reply(&self.name, rx)
    }

    /// Resolves a query to the matching objects.
    pub fn read(&self, data: &str) -> Result<Vec<Value>> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(Command::Read {
            data: data.to_string(),
            reply,
        })?;
        dispatcher::await_reply(&self.name, rx)
    }

    /// Applies a merge patch to the object identified by `user_id`.
    pub fn update(&self, user_id: &str, patch: &str) -> Result<Value> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(Command::Update {
            user_id: user_id.to_string(),
            patch: patch.to_string(),
            reply,
        })?;
        dispatcher::await_reply(&self.name, rx)
    }

    /// Deletes every object matching `data`. Returns the number deleted.
    pub fn delete(&self, data: &str) -> Result<usize> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(Command::Delete {
            data: data.to_string(),
            reply,
        })?;
        dispatcher::await_reply(&self.name, rx)
    }

    /// Every internal id currently live in the collection.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(Command::ListIds { reply })?;
        dispatcher::await_reply(&self.name, rx)
    }

    /// Asks the dispatcher thread to stop after its current queue drains.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| crate::error::Error::Closed(self.name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn spawn_handle() -> (tempfile::TempDir, CollectionHandle) {
        let dir = tempdir().unwrap();
        let engine = Engine::open(
            &dir.path().join("c.db"),
            &dir.path().join("c.index"),
            &dir.path().join("c.attr"),
        )
        .unwrap();
        (dir, CollectionHandle::spawn("c", engine))
    }

    #[test]
    fn write_then_read_through_the_dispatcher() {
        let (_dir, handle) = spawn_handle();
        let id = handle.write(r#"{"id":"a","name":"Jo"}"#).unwrap();
        assert_eq!(id, "a");
        let results = handle.read(r#"{"id":"a"}"#).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn requests_from_multiple_clones_are_serialised() {
        let (_dir, handle) = spawn_handle();
        let mut threads = Vec::new();
        for i in 0..20 {
            let handle = handle.clone();
            threads.push(std::thread::spawn(move || {
                handle
                    .write(&format!(r#"{{"id":"id{i}","n":{i}}}"#))
                    .unwrap();
            }));
        }
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(handle.list_ids().unwrap().len(), 20);
    }

    #[test]
    fn shutdown_causes_subsequent_requests_to_fail() {
        let (_dir, handle) = spawn_handle();
        handle.shutdown();
        // Give the dispatcher thread a chance to observe the shutdown and exit.
        std::thread::sleep(std::time::Duration::from_millis(50));
        let err = handle.write(r#"{"id":"a"}"#).unwrap_err();
        assert_eq!(err.code(), "NOSQL-009");
    }

    #[test]
    fn corruption_poisons_the_collection_and_rejects_subsequent_requests() {
        use crate::storage::format::ID_LENGTH;
        use std::fs::OpenOptions;
        use std::io::{Read, Seek, SeekFrom, Write};

        let dir = tempdir().unwrap();
        let data_path = dir.path().join("c.db");
        let index_path = dir.path().join("c.index");
        let attr_path = dir.path().join("c.attr");
        {
            let mut engine = Engine::open(&data_path, &index_path, &attr_path).unwrap();
            // The write also indexes "/id" and "/_id" (spec §4.5 step 3/6
            // flattens with `_id` present); locate "/x"'s own head rather
            // than assume it is the first head in the file.
            engine.write(r#"{"id":"a","x":1}"#).unwrap();
        }

        let mut file = OpenOptions::new().read(true).write(true).open(&attr_path).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        let needle = b"/x:";
        let needle_pos = contents
            .windows(needle.len())
            .position(|w| w == needle)
            .expect("attribute file should contain a head for \"/x\"");

        // The head node's `next` pointer should be all-NUL (no successor);
        // overwrite it with non-decimal bytes so the next traversal trips
        // `decode_pointer`'s corruption check.
        let pointer_offset = needle_pos + needle.len() + ID_LENGTH + 1;
        file.seek(SeekFrom::Start(pointer_offset as u64)).unwrap();
        file.write_all(b"zzzzz").unwrap();
        drop(file);

        let engine = Engine::open(&data_path, &index_path, &attr_path).unwrap();
        let handle = CollectionHandle::spawn("c", engine);

        let err = handle.read(r#"{"x":1}"#).unwrap_err();
        assert_eq!(err.code(), "NOSQL-007");

        // The dispatcher thread exits after surfacing a fatal error; every
        // subsequent request must be rejected rather than keep operating on
        // an untrustworthy collection.
        std::thread::sleep(std::time::Duration::from_millis(50));
        let err = handle.read(r#"{"x":1}"#).unwrap_err();
        assert_eq!(err.code(), "NOSQL-009");
    }
}
