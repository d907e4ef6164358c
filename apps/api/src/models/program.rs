use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Program level. Closed set shared by programs and student preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramLevel {
    Undergraduate,
    Postgraduate,
    Phd,
}

impl fmt::Display for ProgramLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgramLevel::Undergraduate => "undergraduate",
            ProgramLevel::Postgraduate => "postgraduate",
            ProgramLevel::Phd => "phd",
        };
        f.write_str(s)
    }
}

/// A named curriculum module with an optional credit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub academic_requirements: Vec<String>,
    #[serde(default)]
    pub other_requirements: Vec<String>,
}

/// An educational program. Read-only from the conversation pipeline's
/// perspective; mutated only through the program-management endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub title: String,
    pub institution: String,
    pub overview: String,
    pub location: String,
    pub level: ProgramLevel,
    pub field_of_study: String,
    /// Cost upper bound in whole currency units.
    pub budget: u32,
    pub duration: String,
    #[serde(default)]
    pub curriculum: Curriculum,
    #[serde(default)]
    pub requirements: Requirements,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramCreate {
    pub title: String,
    pub institution: String,
    pub overview: String,
    pub location: String,
    pub level: ProgramLevel,
    pub field_of_study: String,
    pub budget: u32,
    pub duration: String,
    #[serde(default)]
    pub curriculum: Curriculum,
    #[serde(default)]
    pub requirements: Requirements,
}

/// Partial update: only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<ProgramLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<Curriculum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Requirements>,
}

impl ProgramUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.institution.is_none()
            && self.overview.is_none()
            && self.location.is_none()
            && self.level.is_none()
            && self.field_of_study.is_none()
            && self.budget.is_none()
            && self.duration.is_none()
            && self.curriculum.is_none()
            && self.requirements.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProgramLevel::Undergraduate).unwrap(),
            r#""undergraduate""#
        );
        assert_eq!(serde_json::to_string(&ProgramLevel::Phd).unwrap(), r#""phd""#);
    }

    #[test]
    fn test_program_level_rejects_unknown_value() {
        assert!(serde_json::from_str::<ProgramLevel>(r#""diploma""#).is_err());
    }

    #[test]
    fn test_program_update_skips_absent_fields() {
        let update = ProgramUpdate {
            budget: Some(15000),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["budget"], 15000);
    }

    #[test]
    fn test_program_update_is_empty() {
        assert!(ProgramUpdate::default().is_empty());
        assert!(!ProgramUpdate {
            title: Some("MSc Data Science".to_string()),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_program_deserializes_with_defaulted_sections() {
        let json = r#"{
            "id": "7f4df4a2-6d2c-4f3e-9a43-17c25e4f0a31",
            "title": "MSc Data Science",
            "institution": "University of Toronto",
            "overview": "Applied data science",
            "location": "Canada",
            "level": "postgraduate",
            "field_of_study": "Data Science",
            "budget": 15000,
            "duration": "2 years",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let program: Program = serde_json::from_str(json).unwrap();
        assert!(program.curriculum.modules.is_empty());
        assert!(program.requirements.academic_requirements.is_empty());
    }
}
