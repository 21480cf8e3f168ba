//! Which questions apply given the answers so far.

use crate::models::{AnswerSet, Question, QUESTIONS};

/// True when the question has no condition or its condition is met exactly.
pub fn is_visible(question: &Question, answers: &AnswerSet) -> bool {
    match &question.conditional {
        None => true,
        Some(condition) => answers.get(condition.question_id) == Some(&condition.value),
    }
}

/// Visible questions in catalog order. Re-run after every answer change;
/// stored answers are never touched.
pub fn visible_questions(answers: &AnswerSet) -> Vec<&'static Question> {
    QUESTIONS.iter().filter(|q| is_visible(q, answers)).collect()
}

/// Denominator for progress display.
pub fn total_question_count(answers: &AnswerSet) -> usize {
    visible_questions(answers).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerValue, MedicalClearance};

    fn ids(answers: &AnswerSet) -> Vec<&'static str> {
        visible_questions(answers).iter().map(|q| q.id).collect()
    }

    #[test]
    fn clearance_hidden_until_pain_answered_yes() {
        assert_eq!(total_question_count(&AnswerSet::new()), 10);
        assert!(!ids(&AnswerSet::new()).contains(&"q11"));

        let answers = AnswerSet::new().with("q10", AnswerValue::YesNo(true));
        assert_eq!(total_question_count(&answers), 11);
        assert_eq!(ids(&answers).last(), Some(&"q11"));
    }

    #[test]
    fn flipping_pain_to_no_hides_clearance_but_keeps_answer() {
        let mut answers = AnswerSet::new()
            .with("q10", AnswerValue::YesNo(true))
            .with("q11", AnswerValue::Clearance(MedicalClearance::NotEvaluated));
        assert_eq!(total_question_count(&answers), 11);

        answers.set("q10", AnswerValue::YesNo(false));
        assert_eq!(total_question_count(&answers), 10);
        assert_eq!(
            answers.get("q11"),
            Some(&AnswerValue::Clearance(MedicalClearance::NotEvaluated))
        );

        // recomputing is idempotent
        assert_eq!(ids(&answers), ids(&answers.clone()));
    }

    #[test]
    fn condition_requires_exact_value() {
        // a scale 1 is not the boolean true
        let answers = AnswerSet::new().with("q10", AnswerValue::Scale(1));
        assert_eq!(total_question_count(&answers), 10);
    }

    #[test]
    fn order_follows_catalog() {
        let answers = AnswerSet::new().with("q10", AnswerValue::YesNo(true));
        let expected: Vec<String> = (1..=11).map(|i| format!("q{}", i)).collect();
        assert_eq!(ids(&answers), expected);
    }
}
