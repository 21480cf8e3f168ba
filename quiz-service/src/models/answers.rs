//! Quiz answers as submitted by the client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Question id of the chronic-pain screening question.
pub const PAIN_QUESTION: &str = "q10";

/// Question id of the conditional medical-clearance question.
pub const CLEARANCE_QUESTION: &str = "q11";

/// Answer to the medical-clearance question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalClearance {
    YesConfident,
    SeenButUnsure,
    NotEvaluated,
}

impl MedicalClearance {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicalClearance::YesConfident => "yes_confident",
            MedicalClearance::SeenButUnsure => "seen_but_unsure",
            MedicalClearance::NotEvaluated => "not_evaluated",
        }
    }

    /// The wording shown to the respondent.
    pub fn label(&self) -> &'static str {
        match self {
            MedicalClearance::YesConfident => {
                "Yes, I've been checked out and I'm confident my symptoms are nervous system related"
            }
            MedicalClearance::SeenButUnsure => {
                "I've seen doctors but part of me still thinks something is being missed"
            }
            MedicalClearance::NotEvaluated => "I haven't had this fully evaluated yet",
        }
    }
}

impl fmt::Display for MedicalClearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MedicalClearance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes_confident" => Ok(MedicalClearance::YesConfident),
            "seen_but_unsure" => Ok(MedicalClearance::SeenButUnsure),
            "not_evaluated" => Ok(MedicalClearance::NotEvaluated),
            other => Err(format!("unknown medical clearance '{}'", other)),
        }
    }
}

/// A single answer. Scale questions take 1-4, q10 is yes/no and q11 is a
/// clearance choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Scale(u8),
    YesNo(bool),
    Clearance(MedicalClearance),
}

/// Mapping from question id to answer.
///
/// Absent keys are simply unanswered. Hiding a conditional question never
/// removes its stored answer; relevance is decided by the visibility rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, returning the one it replaced.
    pub fn set(&mut self, question_id: impl Into<String>, value: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(question_id.into(), value)
    }

    pub fn with(mut self, question_id: impl Into<String>, value: AnswerValue) -> Self {
        self.set(question_id, value);
        self
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.0.get(question_id)
    }

    /// The 1-4 value of a scale question, or 0 when unanswered or not a
    /// scale answer.
    pub fn scale(&self, question_id: &str) -> u8 {
        match self.0.get(question_id) {
            Some(AnswerValue::Scale(v)) => *v,
            _ => 0,
        }
    }

    /// Raw scale answer, `None` when unanswered.
    pub fn scale_answer(&self, question_id: &str) -> Option<u8> {
        match self.0.get(question_id) {
            Some(AnswerValue::Scale(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn has_chronic_pain(&self) -> bool {
        matches!(self.0.get(PAIN_QUESTION), Some(AnswerValue::YesNo(true)))
    }

    /// Clearance answer, only meaningful while the pain question is `true`.
    pub fn medical_clearance(&self) -> Option<MedicalClearance> {
        if !self.has_chronic_pain() {
            return None;
        }
        match self.0.get(CLEARANCE_QUESTION) {
            Some(AnswerValue::Clearance(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, AnswerValue)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, AnswerValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_mixed_answer_kinds() {
        let answers: AnswerSet = serde_json::from_str(
            r#"{"q1": 3, "q10": true, "q11": "seen_but_unsure"}"#,
        )
        .unwrap();

        assert_eq!(answers.scale("q1"), 3);
        assert!(answers.has_chronic_pain());
        assert_eq!(
            answers.medical_clearance(),
            Some(MedicalClearance::SeenButUnsure)
        );
    }

    #[test]
    fn clearance_is_ignored_without_pain() {
        let answers = AnswerSet::new()
            .with(PAIN_QUESTION, AnswerValue::YesNo(false))
            .with(
                CLEARANCE_QUESTION,
                AnswerValue::Clearance(MedicalClearance::YesConfident),
            );

        assert_eq!(answers.medical_clearance(), None);
        // the stored answer survives
        assert!(answers.get(CLEARANCE_QUESTION).is_some());
    }

    #[test]
    fn non_scale_answers_count_as_zero() {
        let answers = AnswerSet::new().with("q1", AnswerValue::YesNo(true));
        assert_eq!(answers.scale("q1"), 0);
        assert_eq!(answers.scale("q2"), 0);
    }

    #[test]
    fn clearance_round_trips_through_str() {
        for c in [
            MedicalClearance::YesConfident,
            MedicalClearance::SeenButUnsure,
            MedicalClearance::NotEvaluated,
        ] {
            assert_eq!(c.as_str().parse::<MedicalClearance>(), Ok(c));
        }
        assert!("maybe".parse::<MedicalClearance>().is_err());
    }
}
