//! Prompt assembler — renders profile, candidate programs, and recent
//! history into one system instruction block plus the new user message.
//!
//! Pure function of its inputs: identical inputs produce byte-identical
//! output.

use crate::counseling::prompts::COUNSELOR_SYSTEM;
use crate::llm_client::ChatMessage;
use crate::models::program::Program;
use crate::models::student::{ConversationTurn, Student};

/// How many recent turns ride along in the prompt.
pub const HISTORY_WINDOW: usize = 10;

pub fn assemble(
    profile: &Student,
    programs: &[Program],
    history: &[ConversationTurn],
    message: &str,
) -> Vec<ChatMessage> {
    let mut system = String::from(COUNSELOR_SYSTEM);

    system.push_str("\n\nStudent Profile:\n");
    system.push_str(&format!("Name: {}\n", profile.name));
    system.push_str(&format!("Email: {}\n", profile.email));
    if profile.educational_qualifications.is_empty() {
        system.push_str("Educational Qualifications: Not specified\n");
    } else {
        system.push_str("Educational Qualifications:\n");
        for q in &profile.educational_qualifications {
            system.push_str(&format!(
                "  - {}, grade {}, completed {}\n",
                q.qualification, q.grade, q.completion_year
            ));
        }
    }
    system.push_str(&format!(
        "Preferred Locations: {}\n",
        join_or(&profile.preferred_locations, "Not specified")
    ));
    system.push_str(&format!("Preferred Program Level: {}\n", profile.preferred_level));
    system.push_str(&format!(
        "Preferred Fields of Study: {}\n",
        join_or(&profile.preferred_fields_of_study, "Not specified")
    ));
    system.push_str(&format!("Budget: ${}\n", profile.budget));
    system.push_str(&format!(
        "Special Requirements: {}\n",
        join_or(&profile.special_requirements, "None")
    ));

    system.push_str("\nCandidate Programs:\n");
    if programs.is_empty() {
        system.push_str("  (no programs on record)\n");
    } else {
        for (i, p) in programs.iter().enumerate() {
            system.push_str(&format!("{}. {} ({})\n", i + 1, p.title, p.institution));
            system.push_str(&format!(
                "   Location: {} | Level: {} | Duration: {} | Cost: ${}\n",
                p.location, p.level, p.duration, p.budget
            ));
            system.push_str(&format!("   {}\n", p.overview));
        }
    }

    let recent = tail(history, HISTORY_WINDOW);
    if !recent.is_empty() {
        system.push_str("\nRecent Conversation:\n");
        for (i, turn) in recent.iter().enumerate() {
            system.push_str(&format!(
                "{}. {}: {}\n",
                i + 1,
                turn.role.display_name(),
                turn.content
            ));
        }
    }

    vec![ChatMessage::system(system), ChatMessage::user(message)]
}

fn join_or<'a>(items: &[String], fallback: &'a str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

fn tail(turns: &[ConversationTurn], n: usize) -> &[ConversationTurn] {
    &turns[turns.len().saturating_sub(n)..]
}
