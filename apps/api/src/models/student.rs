use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::program::ProgramLevel;

/// One completed qualification on a student's academic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    pub qualification: String,
    pub grade: String,
    pub completion_year: u16,
}

/// Role tag on a conversation turn. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl TurnRole {
    /// Capitalized label used when rendering history into a prompt.
    pub fn display_name(&self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
            TurnRole::System => "System",
        }
    }
}

/// One role-tagged message in a conversation log. Insertion-ordered;
/// duplicate content is permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn now(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only conversation log stored on the student row. Turns are never
/// edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationLog {
    #[serde(default)]
    pub messages: Vec<ConversationTurn>,
}

/// A student profile as persisted in the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub educational_qualifications: Vec<Qualification>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    pub preferred_level: ProgramLevel,
    #[serde(default)]
    pub preferred_fields_of_study: Vec<String>,
    /// Budget ceiling in whole currency units; 0 means "not stated".
    #[serde(default)]
    pub budget: u32,
    #[serde(default)]
    pub special_requirements: Vec<String>,
    #[serde(default)]
    pub conversation_history: ConversationLog,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentCreate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub educational_qualifications: Vec<Qualification>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    pub preferred_level: ProgramLevel,
    #[serde(default)]
    pub preferred_fields_of_study: Vec<String>,
    #[serde(default)]
    pub budget: u32,
    #[serde(default)]
    pub special_requirements: Vec<String>,
}

/// Partial update: only present fields are applied. The conversation log is
/// deliberately absent; turns are appended through the counseling pipeline
/// only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_qualifications: Option<Vec<Qualification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_locations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_level: Option<ProgramLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_fields_of_study: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<Vec<String>>,
}

impl StudentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.educational_qualifications.is_none()
            && self.preferred_locations.is_none()
            && self.preferred_level.is_none()
            && self.preferred_fields_of_study.is_none()
            && self.budget.is_none()
            && self.special_requirements.is_none()
    }
}
