//! Student repository over the row-store seam.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::student::{
    ConversationLog, ConversationTurn, Student, StudentCreate, StudentUpdate,
};
use crate::store::{decode_row, RowFilter, RowStore, StoreError};

const TABLE: &str = "students";

#[derive(Clone)]
pub struct StudentRepo {
    store: Arc<dyn RowStore>,
}

impl StudentRepo {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, create: StudentCreate) -> Result<Student, AppError> {
        let mut record = serde_json::to_value(&create).map_err(StoreError::Decode)?;
        if let Some(map) = record.as_object_mut() {
            // New profiles start with an empty conversation log.
            map.insert(
                "conversation_history".to_string(),
                serde_json::to_value(ConversationLog::default()).map_err(StoreError::Decode)?,
            );
        }
        let row = self.store.insert(TABLE, record).await?;
        Ok(decode_row(row)?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let rows = self
            .store
            .select(TABLE, &RowFilter::new().eq("id", id.to_string()).limit(1))
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => Ok(None),
        }
    }

    /// Applies only the fields present in `update`; returns `None` when no
    /// row matched.
    pub async fn update(
        &self,
        id: Uuid,
        update: StudentUpdate,
    ) -> Result<Option<Student>, AppError> {
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

    /// Appends one turn to the student's conversation log. Read-modify-write
    /// on the log field; last writer wins under concurrent turns.
    pub async fn append_turn(&self, id: Uuid, turn: ConversationTurn) -> Result<(), AppError> {
        let student = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with ID {id} not found")))?;
        let mut log = student.conversation_history;
        log.messages.push(turn);
        self.store
            .update(
                TABLE,
                &RowFilter::new().eq("id", id.to_string()),
                json!({ "conversation_history": log }),
            )
            .await?;
        Ok(())
    }
}
