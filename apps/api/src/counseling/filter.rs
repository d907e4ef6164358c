//! Program filter — successive soft narrowing of the program catalog.
//!
//! Each stage is applied only when its criterion is present, and a stage
//! that would empty the candidate set is skipped instead. The output is
//! therefore always an order-preserving subset of the input and non-empty
//! whenever the input is non-empty. No scoring happens here; ranking is
//! left to the LLM.

use tracing::debug;

use crate::models::program::Program;
use crate::models::student::Student;

/// Upper bound on candidates handed to the prompt assembler.
pub const MAX_CANDIDATES: usize = 50;

/// The subset of a student profile used to narrow programs. Computed fresh
/// each request; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub locations: Vec<String>,
    pub fields_of_study: Vec<String>,
    pub budget: Option<u32>,
}

impl FilterCriteria {
    pub fn from_profile(student: &Student) -> Self {
        Self {
            locations: student.preferred_locations.clone(),
            fields_of_study: student.preferred_fields_of_study.clone(),
            // 0 means the student never stated a budget
            budget: (student.budget > 0).then_some(student.budget),
        }
    }
}

struct SoftStage {
    name: &'static str,
    keep: Box<dyn Fn(&Program) -> bool>,
}

fn build_stages(criteria: &FilterCriteria) -> Vec<SoftStage> {
    let mut stages = Vec::new();

    if !criteria.locations.is_empty() {
        let locations: Vec<String> = criteria.locations.iter().map(|l| l.to_lowercase()).collect();
        stages.push(SoftStage {
            name: "location",
            keep: Box::new(move |program: &Program| {
                let have = program.location.to_lowercase();
                locations
                    .iter()
                    .any(|want| have.contains(want.as_str()) || want.contains(have.as_str()))
            }),
        });
    }

    if !criteria.fields_of_study.is_empty() {
        let fields: Vec<String> = criteria
            .fields_of_study
            .iter()
            .map(|f| f.to_lowercase())
            .collect();
        stages.push(SoftStage {
            name: "field_of_study",
            keep: Box::new(move |program: &Program| {
                let title = program.title.to_lowercase();
                fields.iter().any(|field| title.contains(field.as_str()))
            }),
        });
    }

    if let Some(budget) = criteria.budget {
        stages.push(SoftStage {
            name: "budget",
            keep: Box::new(move |program: &Program| program.budget <= budget),
        });
    }

    stages
}

/// Narrows `programs` by the criteria's soft stages and caps the result.
pub fn filter_programs(programs: &[Program], criteria: &FilterCriteria) -> Vec<Program> {
    let mut candidates: Vec<&Program> = programs.iter().collect();

    for stage in build_stages(criteria) {
        let kept: Vec<&Program> = candidates
            .iter()
            .copied()
            .filter(|program| (stage.keep)(program))
            .collect();
        if kept.is_empty() {
            debug!(
                stage = stage.name,
                "filter stage matched nothing, keeping previous candidates"
            );
        } else {
            candidates = kept;
        }
    }

    candidates.truncate(MAX_CANDIDATES);
    candidates.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::program::{Curriculum, ProgramLevel, Requirements};
    use chrono::Utc;
    use uuid::Uuid;

    fn program(title: &str, location: &str, budget: u32) -> Program {
        Program {
            id: Uuid::new_v4(),
            title: title.to_string(),
            institution: "Test University".to_string(),
            overview: "overview".to_string(),
            location: location.to_string(),
            level: ProgramLevel::Postgraduate,
            field_of_study: "Data Science".to_string(),
            budget,
            duration: "2 years".to_string(),
            curriculum: Curriculum::default(),
            requirements: Requirements::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn criteria(locations: &[&str], fields: &[&str], budget: Option<u32>) -> FilterCriteria {
        FilterCriteria {
            locations: locations.iter().map(|s| s.to_string()).collect(),
            fields_of_study: fields.iter().map(|s| s.to_string()).collect(),
            budget,
        }
    }

    #[test]
    fn test_location_and_budget_narrow_to_matching_program() {
        let programs = vec![
            program("MSc Data Science", "Canada", 15000),
            program("MSc Data Science", "Germany", 30000),
        ];
        let result = filter_programs(&programs, &criteria(&["Canada"], &[], Some(20000)));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].location, "Canada");
        assert_eq!(result[0].budget, 15000);
    }

    #[test]
    fn test_location_match_is_case_insensitive_substring_both_ways() {
        let programs = vec![program("BSc CS", "Toronto, Canada", 10000)];
        // requested value is a substring of the program location
        assert_eq!(
            filter_programs(&programs, &criteria(&["canada"], &[], None)).len(),
            1
        );
        // program location is a substring of the requested value
        let programs = vec![program("BSc CS", "Canada", 10000)];
        assert_eq!(
            filter_programs(&programs, &criteria(&["Toronto, Canada"], &[], None)).len(),
            1
        );
    }

    #[test]
    fn test_unmatched_location_falls_back_to_full_set() {
        let programs = vec![
            program("A", "Canada", 1000),
            program("B", "Germany", 2000),
        ];
        let result = filter_programs(&programs, &criteria(&["Japan"], &[], None));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_field_stage_matches_title_substring() {
        let programs = vec![
            program("MSc Data Science", "Canada", 1000),
            program("LLB Law", "Canada", 1000),
        ];
        let result = filter_programs(&programs, &criteria(&[], &["data science"], None));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "MSc Data Science");
    }

    #[test]
    fn test_budget_stage_falls_back_when_everything_is_too_expensive() {
        let programs = vec![program("A", "Canada", 50000)];
        let result = filter_programs(&programs, &criteria(&[], &[], Some(100)));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_output_is_subset_preserving_order() {
        let programs = vec![
            program("A", "Canada", 3000),
            program("B", "Germany", 1000),
            program("C", "Canada", 2000),
        ];
        let result = filter_programs(&programs, &criteria(&["Canada"], &[], None));
        let titles: Vec<&str> = result.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn test_nonempty_input_never_yields_empty_output() {
        let programs = vec![program("A", "Canada", 50000)];
        let result = filter_programs(
            &programs,
            &criteria(&["Atlantis"], &["alchemy"], Some(1)),
        );
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(filter_programs(&[], &criteria(&["Canada"], &[], None)).is_empty());
    }

    #[test]
    fn test_no_criteria_passes_everything_through() {
        let programs = vec![program("A", "Canada", 1), program("B", "Germany", 2)];
        let result = filter_programs(&programs, &FilterCriteria::default());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_result_is_capped() {
        let programs: Vec<Program> = (0..MAX_CANDIDATES + 10)
            .map(|i| program(&format!("P{i}"), "Canada", 1000))
            .collect();
        let result = filter_programs(&programs, &FilterCriteria::default());
        assert_eq!(result.len(), MAX_CANDIDATES);
        assert_eq!(result[0].title, "P0");
    }

    #[test]
    fn test_criteria_from_profile_treats_zero_budget_as_unstated() {
        use crate::models::student::Student;
        let student = Student {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            educational_qualifications: vec![],
            preferred_locations: vec!["Canada".to_string()],
            preferred_level: ProgramLevel::Postgraduate,
            preferred_fields_of_study: vec![],
            budget: 0,
            special_requirements: vec![],
            conversation_history: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let criteria = FilterCriteria::from_profile(&student);
        assert_eq!(criteria.budget, None);
        assert_eq!(criteria.locations, vec!["Canada".to_string()]);
    }
}
