//! Prompt construction for the insight generator.

use super::InsightContext;
use crate::models::questions::scale_label;

/// Style and output contract sent as the system instruction.
pub const SYSTEM_PROMPT: &str = r#"You write the personalized results page for someone who has just finished a short nervous system self-assessment. Write like a warm, well-informed friend: direct, validating and plain-spoken.

The user message contains their classification ("sensitized" or "not_sensitized"), their trigger, recovery and baseline scores, each answer, whether they live with chronic pain, their medical clearance status and any free text they chose to share.

Write three sections.

whatThisMeans: Two or three sentences. Explain what their result says about how their nervous system is responding. If they shared free text, draw on the specific details of their situation so they feel understood, without quoting it back or announcing that they mentioned it. Make clear that nothing about them is broken. Do not sell anything or mention any program.

whatToDo: Three or four sentences. Speak to the broader shift that helps a sensitized system settle: repeated, slower and gentler experiences that show the body it is safe, practiced consistently over time. Acknowledge the fatigue of searching for answers when their text suggests it. Offer a mindset, not a list of techniques. Do not sell anything or mention any program.

closingMessage: One or two encouraging sentences telling them that follow-up guidance will arrive by email over the next few days.

Style rules:
- Use short declarative sentences joined by commas and periods. Never use em dashes, en dashes or hyphens for pauses or emphasis.
- State the helpful truth directly. Never build a sentence by denying one thing to promote another.
- Banned patterns. A reply containing any of these is rejected:
  * "This isn't about X", "This is not about X", "It's not about X"
  * "not X, Y", "not X. Y", "not X; Y"
  * "X, not Y"
  * "X instead of Y", "X rather than Y", "X over Y", "X versus Y", "choosing X over Y"
  * "less X, more Y", "less of X, more of Y"
  * "stop X and Y", "stop X and start Y"
  * "isn't", "is not", "aren't" or "are not" followed by a contrasting clause
- Banned phrases: "it sounds like", "based on your responses", "here's the thing", "you mentioned", "based on what you shared".
- No bullet points, clinical jargon, rhetorical questions or meta commentary such as "The key is" or "The goal isn't".
- Paragraph breaks inside a section are written as \n\n.

Final self-check before replying:
1. Search the draft for "isn't", "is not", "aren't", "are not", "this is" and "it's".
2. Any sentence where one of those sets up a contrast gets deleted and rewritten as a plain positive statement.
3. Reread every sentence. If it corrects the reader or negates an alternative, rewrite it.

Reply with a single JSON object and nothing else:
{"whatThisMeans": "...", "whatToDo": "...", "closingMessage": "..."}"#;

/// Short descriptor for each scored question, in catalog order.
const ANSWER_DESCRIPTORS: [(&str, &str); 9] = [
    ("q1", "threat response"),
    ("q2", "shrinking safety"),
    ("q3", "body before brain"),
    ("q4", "prolonged activation"),
    ("q5", "body doesn't believe safety"),
    ("q6", "stress bleeding"),
    ("q7", "waking activated"),
    ("q8", "relaxation foreign"),
    ("q9", "background hum"),
];

const PROGRAM_CONTEXT: &str = "Soft Regulation is a gentle approach to nervous system healing. It uses simple somatic practices of ten to fifteen minutes a day, avoids rigid protocols, and builds real safety in the body through slower, softer experiences. Ongoing support and community help people stay consistent when healing gets bumpy.";

/// Render every input as labelled lines for the user turn.
pub fn build_user_message(ctx: &InsightContext) -> String {
    let scores = &ctx.scores;
    let mut lines = vec![
        format!("Result: {}", ctx.result),
        format!(
            "Scores: Trigger {}/12, Recovery {}/12, Baseline {}/12",
            scores.trigger, scores.recovery, scores.baseline
        ),
        format!("Total: {}/36", scores.total),
        String::new(),
        "Answers:".to_string(),
    ];

    for (index, (question_id, descriptor)) in ANSWER_DESCRIPTORS.iter().enumerate() {
        let label = ctx
            .answers
            .scale_answer(question_id)
            .and_then(scale_label)
            .unwrap_or("No answer");
        lines.push(format!("Q{} ({}): {}", index + 1, descriptor, label));
    }

    lines.push(String::new());
    lines.push(format!(
        "Has chronic pain: {}",
        if ctx.has_pain { "yes" } else { "no" }
    ));
    lines.push(format!(
        "Medical clearance: {}",
        ctx.medical_clearance.map(|c| c.label()).unwrap_or("n/a")
    ));
    lines.push(String::new());
    lines.push("Additional context from user:".to_string());
    lines.push(
        ctx.free_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("None provided")
            .to_string(),
    );
    lines.push(String::new());
    lines.push("About Soft Regulation:".to_string());
    lines.push(PROGRAM_CONTEXT.to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerSet, AnswerValue, Classification, MedicalClearance, Scores};

    fn context() -> InsightContext {
        let answers: AnswerSet = (1..=9)
            .map(|i| (format!("q{}", i), AnswerValue::Scale(((i - 1) % 4 + 1) as u8)))
            .collect();
        InsightContext {
            result: Classification::Sensitized,
            scores: Scores {
                trigger: 6,
                recovery: 9,
                baseline: 8,
                total: 23,
            },
            answers,
            has_pain: true,
            medical_clearance: Some(MedicalClearance::SeenButUnsure),
            free_text: None,
        }
    }

    #[test]
    fn renders_scores_and_labelled_answers() {
        let message = build_user_message(&context());

        assert!(message.starts_with("Result: sensitized\n"));
        assert!(message.contains("Scores: Trigger 6/12, Recovery 9/12, Baseline 8/12"));
        assert!(message.contains("Total: 23/36"));
        assert!(message.contains("Q1 (threat response): Rarely"));
        assert!(message.contains("Q4 (prolonged activation): Almost always"));
        assert!(message.contains("Q9 (background hum): Rarely"));
        assert!(message.contains("Has chronic pain: yes"));
        assert!(message.contains(MedicalClearance::SeenButUnsure.label()));
    }

    #[test]
    fn system_prompt_lists_banned_patterns_and_self_check() {
        for pattern in [
            "This isn't about X",
            "X, not Y",
            "X instead of Y",
            "X rather than Y",
            "less X, more Y",
            "stop X and start Y",
            "it sounds like",
            "based on your responses",
            "here's the thing",
            "you mentioned",
        ] {
            assert!(SYSTEM_PROMPT.contains(pattern), "missing {:?}", pattern);
        }

        let check = SYSTEM_PROMPT
            .find("Final self-check")
            .expect("self-check section");
        let contract = SYSTEM_PROMPT.find("Reply with a single JSON object").unwrap();
        assert!(check < contract);
        assert!(!SYSTEM_PROMPT.contains('\u{2014}'));
    }

    #[test]
    fn placeholders_for_absent_values() {
        let ctx = InsightContext {
            has_pain: false,
            medical_clearance: None,
            free_text: Some("   ".to_string()),
            answers: AnswerSet::new(),
            ..context()
        };

        let message = build_user_message(&ctx);

        assert!(message.contains("Medical clearance: n/a"));
        assert!(message.contains("Additional context from user:\nNone provided"));
        assert!(message.contains("Q2 (shrinking safety): No answer"));
    }
}
