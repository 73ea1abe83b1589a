pub mod answer;
pub mod assemble;
pub mod page;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ExtractError;
use crate::layout::{BlockResolver, DocumentLayout};
use crate::report::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Question,
    Solution,
}

impl Role {
    pub fn process(self, text: &str, number: u32) -> Option<String> {
        match self {
            Role::Question => answer::process_question(text, number).map(str::to_string),
            Role::Solution => answer::process_solution(text, number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemRecord {
    pub question: String,
    pub answer: String,
}

/// Records of one document keyed by problem number.
pub type PageExtraction = BTreeMap<u32, ProblemRecord>;

/// Which pages of a worksheet hold the questions and the solutions.
#[derive(Debug, Clone, Copy)]
pub struct PageRoles {
    pub question_page: usize,
    pub solution_page: usize,
}

impl Default for PageRoles {
    fn default() -> Self {
        Self {
            question_page: 0,
            solution_page: 1,
        }
    }
}

/// Two-pass pipeline: question page and solution page → paired records.
pub fn extract_document(
    name: &str,
    layout: &DocumentLayout,
    roles: PageRoles,
    resolver: &BlockResolver,
    reporter: &dyn Reporter,
) -> Result<PageExtraction, ExtractError> {
    let page_at = |index: usize| {
        layout
            .page(index)
            .ok_or_else(|| ExtractError::MalformedDocument {
                path: name.to_string(),
                reason: format!("missing page {}", index + 1),
            })
    };
    let question_page = page_at(roles.question_page)?;
    let solution_page = page_at(roles.solution_page)?;

    let questions: Vec<_> = page::extract_page(question_page, Role::Question, resolver).collect();
    let solutions: Vec<_> = page::extract_page(solution_page, Role::Solution, resolver).collect();
    let paired = questions.len().min(solutions.len());

    let records = assemble::assemble(questions, solutions)?;
    for number in (1..=paired as u32).filter(|n| !records.contains_key(n)) {
        reporter.problem_dropped(name, number);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::load_document;
    use crate::report::testing::RecordingReporter;
    use std::path::Path;

    fn fixture(name: &str) -> DocumentLayout {
        load_document(Path::new(&format!("tests/fixtures/{}.layout.json", name))).unwrap()
    }

    #[test]
    fn addition_worksheet() {
        let reporter = RecordingReporter::default();
        let records = extract_document(
            "addition",
            &fixture("addition"),
            PageRoles::default(),
            &BlockResolver::default(),
            &reporter,
        )
        .unwrap();

        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(
            records[&1].question,
            "Sam has 3 apples and buys 4 more. How many apples does Sam have?"
        );
        assert_eq!(records[&1].answer, "7");
        assert_eq!(records[&2].answer, "7");
        assert_eq!(
            records[&4].question,
            "Mia eats 1 1/2 pies and then 1 3/4 pies. How much pie did she eat?"
        );
        assert_eq!(records[&4].answer, "3 1/4");
        assert_eq!(reporter.events(), vec!["dropped addition #3"]);
    }

    #[test]
    fn well_formed_worksheet_keeps_every_problem() {
        let reporter = RecordingReporter::default();
        let records = extract_document(
            "fractions",
            &fixture("fractions"),
            PageRoles::default(),
            &BlockResolver::default(),
            &reporter,
        )
        .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[&3].answer, "2 1/2");
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn single_page_document_is_malformed() {
        let mut layout = fixture("addition");
        layout.pages.truncate(1);
        let err = extract_document(
            "short",
            &layout,
            PageRoles::default(),
            &BlockResolver::default(),
            &RecordingReporter::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument { .. }));
    }

    #[test]
    fn roles_route_to_processors() {
        assert_eq!(
            Role::Question.process("2. How many?", 2).as_deref(),
            Some("How many?")
        );
        assert_eq!(Role::Solution.process("2. 1 + 1 = 2.", 2).as_deref(), Some("2"));
    }
}
