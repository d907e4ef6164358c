//! Program repository over the row-store seam.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::program::{Program, ProgramCreate, ProgramUpdate};
use crate::store::{decode_row, RowFilter, RowStore, StoreError};

const TABLE: &str = "programs";

#[derive(Clone)]
pub struct ProgramRepo {
    store: Arc<dyn RowStore>,
}

impl ProgramRepo {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, create: ProgramCreate) -> Result<Program, AppError> {
        let record = serde_json::to_value(&create).map_err(StoreError::Decode)?;
        let row = self.store.insert(TABLE, record).await?;
        Ok(decode_row(row)?)
    }

    /// The full catalog, fetched fresh on every call.
    pub async fn list(&self) -> Result<Vec<Program>, AppError> {
        let rows = self.store.select(TABLE, &RowFilter::new()).await?;
        rows.into_iter()
            .map(|row| decode_row(row).map_err(AppError::from))
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Program>, AppError> {
        let rows = self
            .store
            .select(TABLE, &RowFilter::new().eq("id", id.to_string()).limit(1))
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: ProgramUpdate,
    ) -> Result<Option<Program>, AppError> {
        if update.is_empty() {
            return self.get(id).await;
        }
        let patch = serde_json::to_value(&update).map_err(StoreError::Decode)?;
        let rows = self
            .store
            .update(TABLE, &RowFilter::new().eq("id", id.to_string()), patch)
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => Ok(None),
        }
    }

    /// Returns whether a row was actually removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let removed = self
            .store
            .delete(TABLE, &RowFilter::new().eq("id", id.to_string()))
            .await?;
        Ok(removed > 0)
    }
}
