//! Profile extraction — pulls structured profile details out of free text
//! via a low-temperature completion.

use serde::{Deserialize, Serialize};

use crate::counseling::prompts::{EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM};
use crate::llm_client::{
    extract_json_object, ChatMessage, CompletionGateway, LlmError, SamplingConfig,
};
use crate::models::student::{Qualification, StudentUpdate};

/// Details recovered from a student's message. Every field is optional;
/// absent keys mean the message said nothing about them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_qualifications: Option<Vec<Qualification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_locations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_fields_of_study: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<Vec<String>>,
}

impl ExtractedDetails {
    pub fn is_empty(&self) -> bool {
        self.educational_qualifications.is_none()
            && self.preferred_locations.is_none()
            && self.preferred_fields_of_study.is_none()
            && self.budget.is_none()
            && self.special_requirements.is_none()
    }

    pub fn into_update(self) -> StudentUpdate {
        StudentUpdate {
            educational_qualifications: self.educational_qualifications,
            preferred_locations: self.preferred_locations,
            preferred_fields_of_study: self.preferred_fields_of_study,
            budget: self.budget,
            special_requirements: self.special_requirements,
            ..Default::default()
        }
    }
}

/// Asks the gateway to extract profile details from `input_text` and parses
/// the JSON span of the reply.
pub async fn extract_profile_details(
    gateway: &dyn CompletionGateway,
    input_text: &str,
) -> Result<ExtractedDetails, LlmError> {
    let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{input_text}", input_text);
    let messages = vec![
        ChatMessage::system(EXTRACTION_SYSTEM),
        ChatMessage::user(prompt),
    ];
    let text = gateway
        .complete(&messages, &SamplingConfig::extraction())
        .await?;
    let value = extract_json_object(&text)?;
    serde_json::from_value(value).map_err(|e| LlmError::Parse {
        message: e.to_string(),
        raw: text,
    })
}
