use super::{PageExtraction, ProblemRecord};
use crate::error::ExtractError;

/// Pair question and solution sequences position by position. Numbers must
/// agree at every position; a problem with a missing or empty part is left
/// out of the result.
pub fn assemble<Q, S>(questions: Q, solutions: S) -> Result<PageExtraction, ExtractError>
where
    Q: IntoIterator<Item = (u32, Option<String>)>,
    S: IntoIterator<Item = (u32, Option<String>)>,
{
    let mut records = PageExtraction::new();
    for (position, ((question_number, question), (solution_number, answer))) in
        questions.into_iter().zip(solutions).enumerate()
    {
        if question_number != solution_number {
            return Err(ExtractError::StructuralMismatch {
                position,
                question: question_number,
                solution: solution_number,
            });
        }
        match (question, answer) {
            (Some(question), Some(answer)) if !question.is_empty() && !answer.is_empty() => {
                records.insert(question_number, ProblemRecord { question, answer });
            }
            _ => {}
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(n: u32, text: &str) -> (u32, Option<String>) {
        (n, Some(text.to_string()))
    }

    #[test]
    fn pairs_complete_problems() {
        let questions = vec![some(1, "Q1"), some(2, "Q2"), some(3, "Q3")];
        let solutions = vec![some(1, "4"), some(2, "7"), some(3, "3 1/4")];
        let records = assemble(questions, solutions).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[&3].answer, "3 1/4");
    }

    #[test]
    fn drops_incomplete_problems() {
        let questions = vec![some(1, "Q1"), (2, None), some(3, ""), some(4, "Q4")];
        let solutions = vec![some(1, "4"), some(2, "7"), some(3, "9"), (4, None)];
        let records = assemble(questions, solutions).unwrap();
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn mismatched_numbering_is_fatal() {
        let questions = vec![some(1, "Q1"), some(2, "Q2")];
        let solutions = vec![some(1, "4"), some(3, "7")];
        let err = assemble(questions, solutions).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::StructuralMismatch {
                position: 1,
                question: 2,
                solution: 3
            }
        ));
    }

    #[test]
    fn never_more_records_than_the_shorter_side() {
        let questions = vec![some(1, "Q1"), some(2, "Q2"), some(3, "Q3")];
        let solutions = vec![some(1, "4"), some(2, "5")];
        let records = assemble(questions, solutions).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn serializes_with_string_keys() {
        let records = assemble(vec![some(1, "Q1")], vec![some(1, "4")]).unwrap();
        assert_eq!(
            serde_json::to_string(&records).unwrap(),
            r#"{"1":{"question":"Q1","answer":"4"}}"#
        );
    }
}
