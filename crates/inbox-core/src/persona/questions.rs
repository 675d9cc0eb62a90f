//! Interview prompt selection.

use super::params::{PersonaParameter, PersonaParameters};
use super::stage::Stage;
use crate::conversation::ConversationMessage;

/// Characters of a template that identify it in the transcript.
const ECHO_PREFIX_CHARS: usize = 20;

#[derive(Debug, Clone, Copy)]
struct QuestionTemplate {
    text: &'static str,
    /// The parameter the question probes, if any.
    target: Option<PersonaParameter>,
}

const fn question(text: &'static str, target: Option<PersonaParameter>) -> QuestionTemplate {
    QuestionTemplate { text, target }
}

fn templates(stage: Stage) -> &'static [QuestionTemplate] {
    use PersonaParameter::*;
    const INTRODUCTION: &[QuestionTemplate] = &[
        question(
            "Let's set up your avatar. How would you describe the people who usually message you?",
            None,
        ),
        question(
            "Tell me a little about your account and what you post about.",
            None,
        ),
    ];
    const DISCOVERY: &[QuestionTemplate] = &[
        question(
            "What tone should your replies have: playful, warm, professional, something else?",
            Some(Tone),
        ),
        question(
            "How do you usually write to followers? Short and casual, or detailed and careful?",
            Some(CommunicationStyle),
        ),
        question(
            "Which topics are you always happy to talk about?",
            Some(AllowedTopics),
        ),
    ];
    const CORE_COLLECTION: &[QuestionTemplate] = &[
        question(
            "Are there topics your avatar should never discuss?",
            Some(RestrictedTopics),
        ),
        question(
            "Where are your boundaries with followers, for example personal questions or DMs from brands?",
            Some(Boundaries),
        ),
        question(
            "When your avatar is unsure how to answer, what fallback reply should it send?",
            Some(FallbackReply),
        ),
        question(
            "How long should a typical reply be?",
            Some(ResponseLength),
        ),
    ];
    const PERSONA_PREVIEW: &[QuestionTemplate] = &[
        question(
            "Here is a draft of your persona. Does this sound like you?",
            None,
        ),
        question(
            "Any phrases or sign-offs you always use that the avatar should copy?",
            Some(SignaturePhrases),
        ),
    ];
    const COMPLETION: &[QuestionTemplate] = &[
        question(
            "Your avatar persona is ready. Anything you want to adjust before we save it?",
            None,
        ),
    ];

    match stage {
        Stage::Introduction => INTRODUCTION,
        Stage::Discovery => DISCOVERY,
        Stage::CoreCollection => CORE_COLLECTION,
        Stage::PersonaPreview => PERSONA_PREVIEW,
        Stage::Completion => COMPLETION,
    }
}

impl QuestionTemplate {
    fn echoed_in(&self, history: &[ConversationMessage]) -> bool {
        let prefix: String = self.text.chars().take(ECHO_PREFIX_CHARS).collect();
        history.iter().any(|m| m.content.contains(&prefix))
    }

    fn targets_collected(&self, extracted: &PersonaParameters) -> bool {
        self.target
            .is_some_and(|target| extracted.contains_key(target.as_str()))
    }
}

/// Picks the next interview question for `stage` (its snake_case name).
///
/// Prefers a template not yet asked whose parameter is still missing, then
/// any template not yet asked, then the first template. Returns `None` for an
/// unrecognized stage.
pub fn next_question_for_stage(
    stage: &str,
    history: &[ConversationMessage],
    extracted: &PersonaParameters,
) -> Option<&'static str> {
    let stage: Stage = stage.parse().ok()?;
    let candidates = templates(stage);

    let unused: Vec<&QuestionTemplate> = candidates
        .iter()
        .filter(|t| !t.echoed_in(history))
        .collect();

    unused
        .iter()
        .find(|t| !t.targets_collected(extracted))
        .or_else(|| unused.first())
        .copied()
        .or_else(|| candidates.first())
        .map(|t| t.text)
}
