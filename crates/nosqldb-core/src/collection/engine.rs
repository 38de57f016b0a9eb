//! The storage engine: the CRUD façade composing the data file, index file,
//! attribute index, and in-memory index table for one collection (spec
//! §4.5, called `Access` there).

use crate::error::{Error, Result};
use crate::idgen::IdGen;
use crate::json::{flatten, merge_patch};
use crate::storage::{AttrIndex, DataFile, IndexFile, IndexRecord};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// One collection's engine: owns its three file handles and the in-memory
/// index table built from them.
pub struct Engine {
    data: DataFile,
    index: IndexFile,
    attrs: AttrIndex,
    table: crate::storage::IndexTable,
    idgen: IdGen,
}

impl Engine {
    /// Opens (creating if absent) the three files backing a collection and
    /// replays the index file into memory.
    pub fn open(data_path: &Path, index_path: &Path, attr_path: &Path) -> Result<Self> {
        let mut index = IndexFile::open(index_path)?;
        let table = index.load()?;
        let data = DataFile::open(data_path)?;
        let attrs = AttrIndex::open(attr_path)?;
        Ok(Self {
            data,
            index,
            attrs,
            table,
            idgen: IdGen::new(),
        })
    }

    /// Parses `data`, assigns an id if absent, stores the object, and
    /// indexes it. Returns the object's user id.
    pub fn write(&mut self, data: &str) -> Result<String> {
        let value: Value = serde_json::from_str(data)?;
        let Value::Object(mut obj) = value else {
            return Err(Error::MalformedJson("expected a JSON object".to_string()));
        };

        let (user_id, fresh) = match obj.get("id") {
            Some(Value::String(id)) => (id.clone(), false),
            Some(_) => {
                return Err(Error::MalformedJson(
                    "'id' field must be a string".to_string(),
                ))
            }
            None => {
                let synthesised = self.idgen.new_id(data.as_bytes());
                obj.insert("id".to_string(), Value::String(synthesised.clone()));
                (synthesised, true)
            }
        };

        let internal_id = IdGen::hash(&user_id);
        obj.insert("_id".to_string(), Value::String(internal_id.clone()));

        let flattened = flatten(&obj);

        obj.remove("_id");
        let bytes = serde_json::to_vec(&Value::Object(obj))?;
        let size = bytes.len();
        let data_offset = self.data.append(&bytes)?;

        let existing = self.table.get(&internal_id);
        let slot_offset = if fresh || existing.is_none() {
            self.index.append(&internal_id, data_offset, size)?
        } else {
            let slot_offset = existing.unwrap().slot_offset;
            self.index
                .rewrite(slot_offset, &internal_id, data_offset, size)?;
            slot_offset
        };
        self.table.insert(
            internal_id.clone(),
            IndexRecord {
                data_offset,
                size,
                slot_offset,
            },
        );

        for key in flattened.keys() {
            self.attrs.append(&format!("/{key}"), &internal_id)?;
        }

        tracing::debug!(op = "write", id = %user_id, fresh, "object stored");
        Ok(user_id)
    }

    /// Resolves `data` (a query) to the matching objects.
    ///
    /// An `{"id": ...}` query is a direct index lookup and fails with
    /// `NotFound` if the id is absent. Any other query intersects the
    /// attribute postings for each of its (flattened) keys, fetches
    /// candidates, and filters them by value. An empty query returns every
    /// live object.
    pub fn read(&mut self, data: &str) -> Result<Vec<Value>> {
        if data.trim().is_empty() {
            return Err(Error::EmptyRequest);
        }
        let query: Value = serde_json::from_str(data)?;

        if let Some(Value::String(user_id)) = query.get("id") {
            let internal_id = IdGen::hash(user_id);
            let record = self
                .table
                .get(&internal_id)
                .ok_or_else(|| Error::NotFound(user_id.clone()))?;
            let bytes = self.data.read_at(record.data_offset, record.size)?;
            let obj: Value = serde_json::from_slice(&bytes)?;
            return Ok(vec![obj]);
        }

        let query_obj = query.as_object().cloned().unwrap_or_default();
        let flattened = flatten(&query_obj);

        let candidate_ids: Vec<String> = if flattened.is_empty() {
            self.table.ids().map(str::to_string).collect()
        } else {
            let mut postings = Vec::with_capacity(flattened.len());
            for key in flattened.keys() {
                postings.push(self.attrs.iterate(&format!("/{key}"))?);
            }
            inner_join(&postings)
        };

        let mut results = Vec::new();
        for id in candidate_ids {
            let Some(record) = self.table.get(&id) else {
                continue; // stale posting: the object was deleted or replaced
            };
            let bytes = self.data.read_at(record.data_offset, record.size)?;
            let obj: Value = serde_json::from_slice(&bytes)?;
            if matches_query(&obj, &flattened) {
                results.push(obj);
            }
        }
        Ok(results)
    }

    /// Applies an RFC 7396 merge patch to the object identified by
    /// `user_id`, persists the result, and returns the parsed patch.
    pub fn update(&mut self, user_id: &str, patch_data: &str) -> Result<Value> {
        let query = format!(r#"{{"id":{}}}"#, serde_json::to_string(user_id)?);
        let mut objects = self.read(&query)?;
        if objects.is_empty() {
            return Err(Error::NotFound(user_id.to_string()));
        }
        if objects.len() > 1 {
            return Err(Error::Ambiguous(objects.len(), user_id.to_string()));
        }

        let patch: Value = serde_json::from_str(patch_data)?;
        let merged = merge_patch(&objects.remove(0), &patch);
        self.write(&serde_json::to_string(&merged)?)?;
        tracing::debug!(op = "update", id = %user_id, "object patched");
        Ok(patch)
    }

    /// Deletes every object matching `query_data`. Returns the number of
    /// objects deleted. Attribute postings are left in place.
    pub fn delete(&mut self, query_data: &str) -> Result<usize> {
        if query_data.trim().is_empty() {
            return Err(Error::EmptyRequest);
        }
        // An id-keyed query for an id that is no longer in the table fails
        // `read` with `NotFound` (spec §4.5 `read` step 2); `delete`'s error
        // contract (spec §6) carries no such case, so a missing id is simply
        // zero candidates rather than a propagated error.
        let candidates = match self.read(query_data) {
            Ok(candidates) => candidates,
            Err(Error::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };

        let mut deleted = 0;
        for candidate in candidates {
            let Some(Value::String(user_id)) = candidate.get("id") else {
                continue;
            };
            let internal_id = IdGen::hash(user_id);
            let Some(record) = self.table.get(&internal_id) else {
                continue;
            };
            self.data.zero_at(record.data_offset, record.size)?;
            self.index.tombstone(record.slot_offset)?;
            self.table.remove(&internal_id);
            deleted += 1;
        }
        tracing::debug!(op = "delete", count = deleted, "objects removed");
        Ok(deleted)
    }

    /// Every internal id currently held by the in-memory index table.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.table.ids().map(str::to_string).collect()
    }
}

/// Set-intersection over posting lists, preserving the first list's order
/// and deduplicating. An empty input yields an empty result.
fn inner_join(lists: &[Vec<String>]) -> Vec<String> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let rest_sets: Vec<HashSet<&str>> = rest
        .iter()
        .map(|list| list.iter().map(String::as_str).collect())
        .collect();

    let mut seen = HashSet::new();
    first
        .iter()
        .filter(|id| rest_sets.iter().all(|set| set.contains(id.as_str())))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// True iff, for every key/value pair in the flattened query, the
/// candidate's own flattened form has the same value at that dotted path.
fn matches_query(candidate: &Value, flattened_query: &Map<String, Value>) -> bool {
    let Value::Object(candidate_obj) = candidate else {
        return false;
    };
    let flattened_candidate = flatten(candidate_obj);
    flattened_query
        .iter()
        .all(|(key, value)| flattened_candidate.get(key) == Some(value))
}
