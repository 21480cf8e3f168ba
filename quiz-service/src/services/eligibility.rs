//! Call-to-action eligibility and the automation tag that goes with it.

use crate::models::{CtaMode, CtaType, MedicalClearance};

pub const TAG_PROGRAM_JOINED: &str = "program-joined";
pub const TAG_WAITLIST_READY: &str = "waitlist-ready";

/// Everyone is currently eligible. Pain and clearance answers are kept for
/// analytics and stay in the signature so the rule can tighten without
/// touching callers.
pub fn cta_type(_has_pain: bool, _medical_clearance: Option<MedicalClearance>) -> CtaType {
    CtaType::Eligible
}

/// Automation tag for a respondent, `None` when they are not eligible.
pub fn automation_tag(cta_type: CtaType, mode: CtaMode) -> Option<&'static str> {
    if !cta_type.is_eligible() {
        return None;
    }

    match mode {
        CtaMode::Live => Some(TAG_PROGRAM_JOINED),
        CtaMode::Waitlist => Some(TAG_WAITLIST_READY),
    }
}
