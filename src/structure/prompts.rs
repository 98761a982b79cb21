use crate::conversation::{ChatMessage, Role, transcript};

use super::AnalysisKind;
use super::collaborator::PromptMessage;

const JSON_ONLY: &str = "Respond with JSON only. No prose, no markdown fences.";

const CHAT_SYSTEM_PROMPT: &str = "\
You are a calm decision-support assistant. Help the user think through their decision.
Structure every answer so it can be mapped:
- Use bold headers ending in a colon for themes, e.g. **Pros:**, **Cons:**, **Risk Factors:**.
- When there are concrete choices, list them on one line as [OPTIONS: First | Second | Third].
- Close with one sentence starting with \"I recommend\" naming the option you would pick.
Keep answers under 250 words.";

fn shape_instruction(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::MindMap => {
            r#"Build a mind map of the decision. Shape:
{"id":"root","name":"<decision>","type":"root","weight":10,"children":[
  {"id":"<unique>","name":"<label>","type":"topic|option|outcome|pro|con","weight":1-10,
   "isRecommendation":false,"children":[...]}]}
Mark exactly one option per sibling group with "isRecommendation": true. Keep names under 40 characters."#
        }
        AnalysisKind::Projection => {
            r#"Project how each option plays out over time. Shape:
[{"name":"<option>","description":"<one sentence>","data":[{"timeLabel":"<period>","value":0-100}]}]
Use the same five time labels for every option."#
        }
        AnalysisKind::Comparison => {
            r#"Compare the options against 4-6 criteria. Shape:
{"criteria":["<criterion>"],"rows":[{"optionName":"<option>","isRecommended":false,"summary":"<one sentence>",
"scores":[{"criteria":"<criterion>","score":1-10}]}]}"#
        }
        AnalysisKind::DecisionTree => {
            r#"Model the decision as a decision tree. Shape:
{"root":{"id":"<id>","label":"<text>","type":"decision|chance|outcome","probability":0-1,"value":<number>,
"sentiment":"positive|neutral|negative","children":[...]},"recommendation":"<text>"}"#
        }
        AnalysisKind::Swot => {
            r#"Run a SWOT analysis per option. Shape:
{"options":[{"optionName":"<option>","strengths":["..."],"weaknesses":["..."],"opportunities":["..."],
"threats":["..."],"overallScore":1-10}],"recommendedOption":"<option>"}"#
        }
        AnalysisKind::CostBenefit => {
            r#"Weigh costs against benefits per option. Shape:
{"options":[{"optionName":"<option>","costs":[{"id":"<id>","category":"<category>","description":"<text>","magnitude":1-10}],
"benefits":[...same shape...],"netScore":<number>,"recommendation":"<text>"}],"bestOption":"<option>"}"#
        }
        AnalysisKind::Timeline => {
            r#"Lay out milestones for each option. Shape:
{"milestones":[{"id":"<id>","date":"<relative date>","label":"<text>","description":"<text>",
"type":"milestone|decision|risk","optionId":"<id>","optionName":"<option>"}],"options":["<option>"],"timeHorizon":"<span>"}"#
        }
    }
}

pub fn structuring_prompt(kind: AnalysisKind, messages: &[ChatMessage]) -> Vec<PromptMessage> {
    let system = format!(
        "You turn decision conversations into structured data.\n{}\n{JSON_ONLY}",
        shape_instruction(kind)
    );
    let user = format!("Conversation so far:\n\n{}", transcript(messages));
    vec![PromptMessage::system(system), PromptMessage::user(user)]
}

pub fn chat_prompt(messages: &[ChatMessage]) -> Vec<PromptMessage> {
    let mut prompt = Vec::with_capacity(messages.len() + 1);
    prompt.push(PromptMessage::system(CHAT_SYSTEM_PROMPT));
    prompt.extend(messages.iter().map(|message| match message.role {
        Role::User => PromptMessage::user(message.text.clone()),
        Role::Model => PromptMessage::assistant(message.text.clone()),
    }));
    prompt
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::collaborator::PromptRole;
    use super::*;

    #[test]
    fn structuring_prompt_embeds_transcript_and_shape() {
        let messages = [ChatMessage::user("Should I move?")];
        let prompt = structuring_prompt(AnalysisKind::Swot, &messages);
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, PromptRole::System);
        assert!(prompt[0].content.contains("recommendedOption"));
        assert!(prompt[1].content.contains("User: Should I move?"));
    }

    #[test]
    fn chat_prompt_maps_roles() {
        let messages = [ChatMessage::user("a"), ChatMessage::model("b")];
        let roles = chat_prompt(&messages)
            .into_iter()
            .map(|message| message.role)
            .collect::<Vec<_>>();
        assert_eq!(roles, [PromptRole::System, PromptRole::User, PromptRole::Assistant]);
    }
}
