//! # Typed Repository
//!
//! [`Repository<T>`] binds one [`RecordStore`] to one [`Mapper<T>`] and speaks
//! in entities instead of rows. There is one generic type for every
//! collection. What differs between entity types is only the injected mapper.
//!
//! ## Operations
//!
//! | Operation | Store primitive | Absent id / value |
//! |---|---|---|
//! | `find_one(id)` | `read_by_key` | `Ok(None)` |
//! | `find_by(column, value)` | `find_by_column` | `Ok(None)` |
//! | `find_many(column, value)` | `find_lines_by_column` | `Ok(vec![])` |
//! | `find_all()` | `read_lines` | `Ok(vec![])` |
//! | `save(entity)` | `append` | n/a |
//! | `save_all(entities)` | `append_all` / `append_all_unique` | n/a |
//! | `update(entity)` | `replace_by_key` | `Err(NotFound)` |
//! | `delete(id)` | `delete_by_key` | `Err(NotFound)` |
//!
//! ## Malformed Rows
//!
//! Listing operations (`find_all`, `find_many`) skip rows that fail to decode and
//! log a warning, so one bad line cannot hide the rest of a collection. A line
//! that is not valid UTF-8 counts as malformed too.
//! [`Repository::scan_all`] returns the skipped rows alongside the good ones.
//! Single-row lookups (`find_one`, `find_by`) return the decode error for the
//! row they landed on.
//!
//! ## Identifier Uniqueness
//!
//! `save` always appends, so it must only be used for new entities. By default
//! duplicate identifiers are tolerated, which existing data files rely on.
//! [`Repository::with_unique_ids`] turns on a check that rejects a save whose
//! id is already present. The check and the append run under the store's path
//! lock, so two saves racing on one file cannot both pass it.

use crate::codec::Mapper;
use crate::error::{CarefileError, DecodeError, Result};
use crate::model::{Collection, Entity};
use crate::store::{Line, RecordStore, Row};
use log::warn;
use std::path::Path;

pub mod registry;

pub use registry::Repositories;

/// A row that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    /// 1-based line number in the file; the header is line 1.
    pub line: usize,
    pub key: String,
    pub error: DecodeError,
}

/// Result of a tolerant full scan.
#[derive(Debug, Clone)]
pub struct Scan<T> {
    pub entities: Vec<T>,
    pub malformed: Vec<MalformedRow>,
}

pub struct Repository<T> {
    store: RecordStore,
    mapper: Mapper<T>,
    unique_ids: bool,
}

impl<T: Entity> Repository<T> {
    /// Opens `<data_dir>/<collection><file_ext>`, creating it if needed.
    pub fn open(data_dir: &Path, mapper: Mapper<T>, file_ext: &str) -> Result<Self> {
        let path = data_dir.join(mapper.collection.file_name(file_ext));
        let store = RecordStore::open(path, mapper.header)?;
        Ok(Self::with_store(store, mapper))
    }

    pub fn with_store(store: RecordStore, mapper: Mapper<T>) -> Self {
        Self {
            store,
            mapper,
            unique_ids: false,
        }
    }

    pub fn with_unique_ids(mut self, unique_ids: bool) -> Self {
        self.unique_ids = unique_ids;
        self
    }

    pub fn collection(&self) -> Collection {
        self.mapper.collection
    }

    pub fn mapper(&self) -> Mapper<T> {
        self.mapper
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    fn decode(&self, row: &Row) -> Result<T> {
        self.mapper
            .decode(row)
            .map_err(|source| CarefileError::Decode {
                collection: self.collection().to_string(),
                source,
            })
    }

    fn decode_tolerant(&self, lines: Vec<Line>) -> Scan<T> {
        let mut scan = Scan {
            entities: Vec::with_capacity(lines.len()),
            malformed: Vec::new(),
        };
        for line in lines {
            let decoded = match line.row() {
                Some(row) => self.mapper.decode(row),
                None => Err(DecodeError::InvalidEncoding),
            };
            match decoded {
                Ok(entity) => scan.entities.push(entity),
                Err(error) => {
                    warn!(
                        "event=decode module=repo status=skipped collection={} line={} key={} error={}",
                        self.collection(),
                        line.number(),
                        line.key(),
                        error
                    );
                    scan.malformed.push(MalformedRow {
                        line: line.number(),
                        key: line.key(),
                        error,
                    });
                }
            }
        }
        scan
    }

    pub fn find_one(&self, id: &str) -> Result<Option<T>> {
        self.store
            .read_by_key(id)?
            .map(|row| self.decode(&row))
            .transpose()
    }

    pub fn find_by(&self, column: &str, value: &str) -> Result<Option<T>> {
        self.store
            .find_by_column(column, value)?
            .map(|row| self.decode(&row))
            .transpose()
    }

    pub fn find_many(&self, column: &str, value: &str) -> Result<Vec<T>> {
        let lines = self.store.find_lines_by_column(column, value)?;
        Ok(self.decode_tolerant(lines).entities)
    }

    pub fn find_all(&self) -> Result<Vec<T>> {
        Ok(self.scan_all()?.entities)
    }

    pub fn scan_all(&self) -> Result<Scan<T>> {
        let lines = self.store.read_lines()?;
        Ok(self.decode_tolerant(lines))
    }

    pub fn count(&self) -> Result<usize> {
        self.store.row_count()
    }

    pub fn save(&self, entity: &T) -> Result<()> {
        self.save_all(std::slice::from_ref(entity))
    }

    /// Appends every entity in order. Used for bulk imports.
    pub fn save_all(&self, entities: &[T]) -> Result<()> {
        let rows: Vec<Row> = entities.iter().map(|e| self.mapper.encode(e)).collect();
        if self.unique_ids {
            self.store.append_all_unique(&rows)
        } else {
            self.store.append_all(&rows)
        }
    }

    /// Rewrites the row whose key is the entity's id.
    pub fn update(&self, entity: &T) -> Result<()> {
        let row = self.mapper.encode(entity);
        self.store.replace_by_key(entity.id(), row)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.store.delete_by_key(id)
    }
}
