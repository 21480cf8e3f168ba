//! Quiz scoring.
//!
//! Each category sums three 1-4 answers, so a complete answer set scores
//! 3-12 per category and 9-36 overall.

use crate::models::{AnswerSet, Classification, Scores};

pub const TRIGGER_QUESTIONS: [&str; 3] = ["q1", "q2", "q3"];
pub const RECOVERY_QUESTIONS: [&str; 3] = ["q4", "q5", "q6"];
pub const BASELINE_QUESTIONS: [&str; 3] = ["q7", "q8", "q9"];

/// A baseline at or above this is sensitized regardless of total.
pub const BASELINE_THRESHOLD: u16 = 8;

/// A total at or above this is sensitized regardless of baseline.
pub const TOTAL_THRESHOLD: u16 = 27;

fn category_score(answers: &AnswerSet, questions: &[&str]) -> u16 {
    questions.iter().map(|q| u16::from(answers.scale(q))).sum()
}

/// Sum category answers. Unanswered questions count as zero.
pub fn calculate_scores(answers: &AnswerSet) -> Scores {
    let trigger = category_score(answers, &TRIGGER_QUESTIONS);
    let recovery = category_score(answers, &RECOVERY_QUESTIONS);
    let baseline = category_score(answers, &BASELINE_QUESTIONS);

    Scores {
        trigger,
        recovery,
        baseline,
        total: trigger + recovery + baseline,
    }
}

pub fn determine_result(scores: &Scores) -> Classification {
    if scores.baseline >= BASELINE_THRESHOLD || scores.total >= TOTAL_THRESHOLD {
        Classification::Sensitized
    } else {
        Classification::NotSensitized
    }
}
