//! The fixed question catalog.

use super::answers::{AnswerValue, MedicalClearance, CLEARANCE_QUESTION, PAIN_QUESTION};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Trigger,
    Recovery,
    Baseline,
    Pain,
    Clearance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Scale,
    YesNo,
    Choice,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChoiceOption {
    pub value: AnswerValue,
    pub label: &'static str,
}

/// Shows a question only when an earlier answer equals `value` exactly.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub question_id: &'static str,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub category: QuestionCategory,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<&'static str>,
    pub options: &'static [ChoiceOption],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Condition>,
}

pub const SCALE_OPTIONS: [ChoiceOption; 4] = [
    ChoiceOption {
        value: AnswerValue::Scale(1),
        label: "Rarely",
    },
    ChoiceOption {
        value: AnswerValue::Scale(2),
        label: "Sometimes",
    },
    ChoiceOption {
        value: AnswerValue::Scale(3),
        label: "Often",
    },
    ChoiceOption {
        value: AnswerValue::Scale(4),
        label: "Almost always",
    },
];

const YES_NO_OPTIONS: [ChoiceOption; 2] = [
    ChoiceOption {
        value: AnswerValue::YesNo(true),
        label: "Yes",
    },
    ChoiceOption {
        value: AnswerValue::YesNo(false),
        label: "No",
    },
];

const CLEARANCE_OPTIONS: [ChoiceOption; 3] = [
    ChoiceOption {
        value: AnswerValue::Clearance(MedicalClearance::YesConfident),
        label: "Yes, I've been checked out and I'm confident my symptoms are nervous system related",
    },
    ChoiceOption {
        value: AnswerValue::Clearance(MedicalClearance::SeenButUnsure),
        label: "I've seen doctors but part of me still thinks something is being missed",
    },
    ChoiceOption {
        value: AnswerValue::Clearance(MedicalClearance::NotEvaluated),
        label: "I haven't had this fully evaluated yet",
    },
];

/// Label for a 1-4 scale value.
pub fn scale_label(value: u8) -> Option<&'static str> {
    SCALE_OPTIONS
        .iter()
        .find(|o| o.value == AnswerValue::Scale(value))
        .map(|o| o.label)
}

const fn scale(
    id: &'static str,
    category: QuestionCategory,
    text: &'static str,
    helper: Option<&'static str>,
) -> Question {
    Question {
        id,
        category,
        kind: QuestionKind::Scale,
        text,
        helper,
        options: &SCALE_OPTIONS,
        conditional: None,
    }
}

pub static QUESTIONS: [Question; 11] = [
    scale(
        "q1",
        QuestionCategory::Trigger,
        "My body reacts to things that aren't actually dangerous, a text notification, someone's tone, a weird sensation, like they're real threats.",
        None,
    ),
    scale(
        "q2",
        QuestionCategory::Trigger,
        "Things that didn't used to bother me now set me off. My world of \"safe\" keeps shrinking.",
        Some("Example: Places you used to go, sounds you used to tolerate, situations you used to handle"),
    ),
    scale(
        "q3",
        QuestionCategory::Trigger,
        "My body reacts before my brain catches up, I'm already in panic or shutdown before I even know what triggered it.",
        Some("Example: Heart racing before you've consciously registered what's wrong"),
    ),
    scale(
        "q4",
        QuestionCategory::Recovery,
        "After something stressful, I stay activated for hours or days, even when the situation is completely over.",
        None,
    ),
    scale(
        "q5",
        QuestionCategory::Recovery,
        "Even when I know I'm safe, my body doesn't believe me. The racing heart, the tension, the dread, it just keeps going.",
        None,
    ),
    scale(
        "q6",
        QuestionCategory::Recovery,
        "Stress from one area of my life bleeds into everything else. I can't contain it.",
        Some("Example: A hard morning at work ruins your entire evening, or one bad interaction affects your whole week"),
    ),
    scale(
        "q7",
        QuestionCategory::Baseline,
        "I wake up already activated, anxious, bracing, or exhausted, before the day has even started.",
        None,
    ),
    scale(
        "q8",
        QuestionCategory::Baseline,
        "Real relaxation feels foreign. I can distract myself or collapse from exhaustion, but actually feeling calm and safe in my body is rare.",
        None,
    ),
    scale(
        "q9",
        QuestionCategory::Baseline,
        "Even in objectively calm moments, there's a hum underneath, a low-grade anxiety, unease, or like I'm waiting for something bad to happen.",
        Some("Example: You're on vacation or having a good day, but your body still feels \"on\""),
    ),
    Question {
        id: PAIN_QUESTION,
        category: QuestionCategory::Pain,
        kind: QuestionKind::YesNo,
        text: "Are you dealing with chronic pain or persistent physical symptoms, things like back pain, nerve pain, headaches, fibromyalgia, or other pain that hasn't gone away?",
        helper: None,
        options: &YES_NO_OPTIONS,
        conditional: None,
    },
    Question {
        id: CLEARANCE_QUESTION,
        category: QuestionCategory::Clearance,
        kind: QuestionKind::Choice,
        text: "Have you ruled out structural damage, disease, or other medical causes for your pain, and do you trust that nothing major is being missed?",
        helper: None,
        options: &CLEARANCE_OPTIONS,
        conditional: Some(Condition {
            question_id: PAIN_QUESTION,
            value: AnswerValue::YesNo(true),
        }),
    },
];

pub fn find_question(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keeps_published_wording() {
        let text = |id: &str| find_question(id).map(|q| q.text).unwrap_or_default();

        assert_eq!(
            text("q1"),
            "My body reacts to things that aren't actually dangerous, a text notification, someone's tone, a weird sensation, like they're real threats."
        );
        assert_eq!(
            text("q7"),
            "I wake up already activated, anxious, bracing, or exhausted, before the day has even started."
        );
        assert_eq!(
            text("q9"),
            "Even in objectively calm moments, there's a hum underneath, a low-grade anxiety, unease, or like I'm waiting for something bad to happen."
        );
    }

    #[test]
    fn no_dash_punctuation_in_catalog() {
        for question in QUESTIONS.iter() {
            let copy = [question.text, question.helper.unwrap_or_default()];
            for line in copy {
                assert!(
                    !line.contains('\u{2014}') && !line.contains('\u{2013}'),
                    "{} contains a dash",
                    question.id
                );
            }
        }
    }
}
