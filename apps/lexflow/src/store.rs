//! # redb Case Store
//!
//! Durable storage of case snapshots for the CLI.
//!
//! One table, `cases`, maps the case id to the snapshot bytes produced by
//! [`lexflow_core::case_to_bytes`]. Updates run read-modify-write inside a
//! single write transaction, so a failed engine operation never reaches
//! disk.

use lexflow_core::{CaseId, CaseWorkflowState, LexflowError, case_from_bytes, case_to_bytes};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for cases: case id -> snapshot bytes
const CASES: TableDefinition<&str, &[u8]> = TableDefinition::new("cases");

fn io(e: impl std::fmt::Display) -> LexflowError {
    LexflowError::IoError(e.to_string())
}

/// A redb-backed store of case snapshots.
pub struct CaseStore {
    db: Database,
}

impl std::fmt::Debug for CaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseStore").finish_non_exhaustive()
    }
}

impl CaseStore {
    /// Open or create a case database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LexflowError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let write_txn = db.begin_write().map_err(io)?;
        let _ = write_txn.open_table(CASES).map_err(io)?;
        write_txn.commit().map_err(io)?;

        Ok(Self { db })
    }

    /// Store a newly opened case. Fails if the id is taken.
    pub fn create(&self, state: &CaseWorkflowState) -> Result<(), LexflowError> {
        let bytes = case_to_bytes(state)?;
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(CASES).map_err(io)?;
            if table.get(state.case_id.as_str()).map_err(io)?.is_some() {
                return Err(LexflowError::DuplicateCase(state.case_id.clone()));
            }
            table
                .insert(state.case_id.as_str(), bytes.as_slice())
                .map_err(io)?;
        }
        write_txn.commit().map_err(io)
    }

    /// Insert or overwrite a case.
    pub fn save(&self, state: &CaseWorkflowState) -> Result<(), LexflowError> {
        let bytes = case_to_bytes(state)?;
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(CASES).map_err(io)?;
            table
                .insert(state.case_id.as_str(), bytes.as_slice())
                .map_err(io)?;
        }
        write_txn.commit().map_err(io)
    }

    /// Load a case, if stored.
    pub fn load(&self, case_id: &CaseId) -> Result<Option<CaseWorkflowState>, LexflowError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(CASES).map_err(io)?;
        let Some(guard) = table.get(case_id.as_str()).map_err(io)? else {
            return Ok(None);
        };
        case_from_bytes(guard.value()).map(Some)
    }

    /// Load a case that must exist.
    pub fn require(&self, case_id: &CaseId) -> Result<CaseWorkflowState, LexflowError> {
        self.load(case_id)?
            .ok_or_else(|| LexflowError::CaseNotFound(case_id.clone()))
    }

    /// Apply `op` to a stored case and persist the result atomically.
    ///
    /// If `op` fails nothing is written.
    pub fn update(
        &self,
        case_id: &CaseId,
        op: impl FnOnce(&CaseWorkflowState) -> Result<CaseWorkflowState, LexflowError>,
    ) -> Result<CaseWorkflowState, LexflowError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let updated = {
            let mut table = write_txn.open_table(CASES).map_err(io)?;
            let current = {
                let guard = table
                    .get(case_id.as_str())
                    .map_err(io)?
                    .ok_or_else(|| LexflowError::CaseNotFound(case_id.clone()))?;
                case_from_bytes(guard.value())?
            };
            let updated = op(&current)?;
            let bytes = case_to_bytes(&updated)?;
            table
                .insert(case_id.as_str(), bytes.as_slice())
                .map_err(io)?;
            updated
        };
        write_txn.commit().map_err(io)?;
        Ok(updated)
    }

    /// All cases, ordered by case id.
    pub fn list(&self) -> Result<Vec<CaseWorkflowState>, LexflowError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(CASES).map_err(io)?;
        let mut cases = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            cases.push(case_from_bytes(value.value())?);
        }
        Ok(cases)
    }

    /// Number of stored cases.
    pub fn len(&self) -> Result<u64, LexflowError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(CASES).map_err(io)?;
        table.len().map_err(io)
    }

    pub fn is_empty(&self) -> Result<bool, LexflowError> {
        Ok(self.len()? == 0)
    }
}
