use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::conversation::{ChatMessage, Role};
use crate::util::{capitalize, stable_id, truncate_label, word_count};

use super::node::{MindMapNode, NodeKind};

pub const INSTANT_ROOT_ID: &str = "root-instant";
pub const INSTANT_ROOT_NAME: &str = "Thought Space";

const FALLBACK_TOPIC_WORDS: usize = 4;
const FALLBACK_TOPIC_CHARS: usize = 30;
const MAX_HEADER_CHARS: usize = 40;
const MAX_BULLET_CHARS: usize = 40;
const MAX_BULLET_WORDS: usize = 5;
const MAX_NUMBERED_WORDS: usize = 6;
const MAX_RECOMMENDATION_CHARS: usize = 40;

const OPTION_LIST_TOP_WEIGHT: f32 = 7.0;
const HEADER_OPTION_WEIGHT: f32 = 7.0;
const HEADER_PRO_CON_WEIGHT: f32 = 6.0;
const NUMBERED_WEIGHT: f32 = 6.0;
const BULLET_WEIGHT: f32 = 5.0;
const RECOMMENDED_WEIGHT: f32 = 10.0;
const TOPIC_WEIGHT: f32 = 8.0;
const ROOT_WEIGHT: f32 = 10.0;

static TOPIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bshould\s+i\s+([^?.!\n]+)",
        r"(?i)\bhelp\s+me\s+(?:choose|decide|pick)\s+(?:between\s+)?([^?.!\n]+)",
        r"(?i)\bchoosing\s+between\s+([^?.!\n]+)",
        r"(?i)\bwhat\s+([^?.!\n]+?)\s+should\b",
        r"(?i)\bbest\s+([^?.!\n]+?)\s+for\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("topic pattern compiles"))
    .collect()
});

static OPTION_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[OPTIONS:\s*([^\]]*)\]").expect("option list pattern compiles")
});

static BOLD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*\n]+?):\*\*").expect("bold header pattern compiles")
});

static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*•][ \t]+(.+?)[ \t]*$").expect("bullet pattern compiles")
});

static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+(?:\*\*([^*\n]+?)\*\*.*|(.+?))[ \t]*$")
        .expect("numbered pattern compiles")
});

static RECOMMENDATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:recommend(?:ation)?|suggest(?:ion)?|best option|my choice)\b[\s:]*(?:is\s+|would be\s+|to\s+)?([^.!?\n]+)",
    )
    .expect("recommendation pattern compiles")
});

/// Node collected from one model message before ids are assigned.
#[derive(Clone, Debug)]
struct Mined {
    name: String,
    kind: NodeKind,
    weight: f32,
    mined_weight: f32,
    is_recommendation: bool,
}

impl Mined {
    fn new(name: impl Into<String>, kind: NodeKind, weight: f32) -> Self {
        Self {
            name: name.into(),
            kind,
            weight,
            mined_weight: weight,
            is_recommendation: false,
        }
    }

    fn promote(&mut self) {
        self.is_recommendation = true;
        self.weight = RECOMMENDED_WEIGHT;
    }

    fn demote(&mut self) {
        self.is_recommendation = false;
        self.weight = self.mined_weight;
    }
}

pub fn empty_root() -> MindMapNode {
    MindMapNode::new(INSTANT_ROOT_ID, INSTANT_ROOT_NAME, NodeKind::Root, ROOT_WEIGHT)
}

/// Builds a mind map from the conversation without any network call.
///
/// Never fails: with nothing to mine the result is a childless root.
pub fn extract(messages: &[ChatMessage]) -> MindMapNode {
    if messages.is_empty() {
        return empty_root();
    }

    let first_user = messages.iter().find(|message| message.role == Role::User);
    let topic = first_user
        .map(|message| extract_topic(&message.text))
        .unwrap_or_else(|| "Decision".to_owned());

    let mut mined = Vec::new();
    for message in messages.iter().filter(|message| message.role == Role::Model) {
        mine_message(&message.text, &mut mined);
    }

    if mined.is_empty() {
        debug!("instant extraction found no structure in {} messages", messages.len());
        return empty_root();
    }

    if !mined.iter().any(|node| node.is_recommendation)
        && let Some(first_option) = mined.iter_mut().find(|node| node.kind == NodeKind::Option)
    {
        first_option.promote();
    }

    let topic_id = stable_id("topic", INSTANT_ROOT_ID, &topic, 0);
    let mut topic_node = MindMapNode::new(topic_id.clone(), topic, NodeKind::Topic, TOPIC_WEIGHT);
    topic_node.children = mined
        .into_iter()
        .enumerate()
        .map(|(position, node)| MindMapNode {
            id: stable_id(node.kind.label(), &topic_id, &node.name, position),
            name: node.name,
            kind: node.kind,
            weight: node.weight,
            children: Vec::new(),
            is_recommendation: node.is_recommendation,
            collapsed: false,
        })
        .collect();

    let mut root = empty_root();
    root.children.push(topic_node);
    root
}

pub fn extract_topic(text: &str) -> String {
    for pattern in TOPIC_PATTERNS.iter() {
        let Some(captured) = pattern.captures(text).and_then(|captures| captures.get(1)) else {
            continue;
        };

        let topic = captured
            .as_str()
            .trim()
            .trim_end_matches([',', ';', ':'])
            .trim();
        if !topic.is_empty() {
            return capitalize(topic);
        }
    }

    let words = text
        .split_whitespace()
        .take(FALLBACK_TOPIC_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    if words.is_empty() {
        return "Decision".to_owned();
    }
    truncate_label(&words, FALLBACK_TOPIC_CHARS)
}

fn mine_message(text: &str, mined: &mut Vec<Mined>) {
    let start = mined.len();

    for captures in OPTION_LIST.captures_iter(text) {
        let choices = captures
            .get(1)
            .map(|list| list.as_str())
            .unwrap_or_default()
            .split('|')
            .map(str::trim)
            .filter(|choice| !choice.is_empty());
        for (position, choice) in choices.enumerate() {
            let weight = (OPTION_LIST_TOP_WEIGHT - position as f32).max(1.0);
            push_unique(mined, start, Mined::new(choice, NodeKind::Option, weight));
        }
    }

    for captures in BOLD_HEADER.captures_iter(text) {
        let Some(label) = captures.get(1).map(|label| label.as_str().trim()) else {
            continue;
        };
        if label.is_empty() || label.chars().count() >= MAX_HEADER_CHARS {
            continue;
        }

        let kind = classify_header(label);
        let weight = match kind {
            NodeKind::Pro | NodeKind::Con => HEADER_PRO_CON_WEIGHT,
            _ => HEADER_OPTION_WEIGHT,
        };
        push_unique(mined, start, Mined::new(label, kind, weight));
    }

    for captures in BULLET_LINE.captures_iter(text) {
        let Some(line) = captures.get(1).map(|line| line.as_str().trim()) else {
            continue;
        };
        let length = line.chars().count();
        let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
        if !starts_upper
            || !(2..=MAX_BULLET_CHARS).contains(&length)
            || word_count(line) > MAX_BULLET_WORDS
        {
            continue;
        }
        push_unique(mined, start, Mined::new(line, NodeKind::Option, BULLET_WEIGHT));
    }

    for captures in NUMBERED_LINE.captures_iter(text) {
        let Some(label) = captures.get(1).or_else(|| captures.get(2)) else {
            continue;
        };
        let label = label.as_str().trim().trim_end_matches(':').trim();
        if label.is_empty() || word_count(label) > MAX_NUMBERED_WORDS {
            continue;
        }
        push_unique(mined, start, Mined::new(label, NodeKind::Option, NUMBERED_WEIGHT));
    }

    if let Some(phrase) = recommendation_phrase(text) {
        // all mined nodes are siblings, so the latest recommendation wins
        mined.iter_mut().for_each(Mined::demote);
        let needle = phrase.to_lowercase();
        let matched = mined.iter_mut().find(|node| {
            let name = node.name.to_lowercase();
            name.contains(&needle) || needle.contains(&name)
        });
        match matched {
            Some(node) => node.promote(),
            None => {
                let mut node = Mined::new(phrase, NodeKind::Option, RECOMMENDED_WEIGHT);
                node.promote();
                mined.push(node);
            }
        }
    }
}

fn push_unique(mined: &mut Vec<Mined>, message_start: usize, node: Mined) {
    if mined[message_start..]
        .iter()
        .any(|existing| existing.name == node.name)
    {
        return;
    }
    mined.push(node);
}

fn classify_header(label: &str) -> NodeKind {
    let lower = label.to_lowercase();
    if ["disadvantage", "con", "risk"]
        .iter()
        .any(|keyword| lower.contains(keyword))
    {
        NodeKind::Con
    } else if ["pro", "advantage", "benefit"]
        .iter()
        .any(|keyword| lower.contains(keyword))
    {
        NodeKind::Pro
    } else {
        NodeKind::Option
    }
}

fn recommendation_phrase(text: &str) -> Option<String> {
    let captured = RECOMMENDATION.captures(text)?.get(1)?;
    let phrase = captured
        .as_str()
        .replace("**", "")
        .trim()
        .trim_matches(|ch: char| matches!(ch, ':' | '"' | '\'' | ',' | '*'))
        .trim()
        .to_owned();

    if phrase.is_empty() || phrase.chars().count() > MAX_RECOMMENDATION_CHARS {
        return None;
    }
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn topic_children(root: &MindMapNode) -> &[MindMapNode] {
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].kind, NodeKind::Topic);
        &root.children[0].children
    }

    #[test]
    fn empty_conversation_yields_childless_root() {
        let root = extract(&[]);
        assert_eq!(root.id, INSTANT_ROOT_ID);
        assert_eq!(root.name, INSTANT_ROOT_NAME);
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.weight, 10.0);
        assert!(root.children.is_empty());
    }

    #[test]
    fn conversation_without_structure_yields_childless_root() {
        let root = extract(&[
            ChatMessage::user("hello there"),
            ChatMessage::model("hi, how can i help today"),
        ]);
        assert!(root.children.is_empty());
    }

    #[test]
    fn option_list_keeps_order_with_decreasing_weights() {
        let root = extract(&[
            ChatMessage::user("Which one?"),
            ChatMessage::model("Consider these. [OPTIONS: A | B | C]"),
        ]);
        let options = topic_children(&root)
            .iter()
            .filter(|node| node.kind == NodeKind::Option)
            .collect::<Vec<_>>();

        let names = options.iter().map(|node| node.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["A", "B", "C"]);
        // the first option is promoted because nothing else was recommended
        assert_eq!(options[0].weight, 10.0);
        assert_eq!(options[1].weight, 6.0);
        assert_eq!(options[2].weight, 5.0);
    }

    #[test]
    fn option_list_weights_decrease_strictly_before_promotion() {
        let mut mined = Vec::new();
        mine_message("[OPTIONS: A | B | C]", &mut mined);
        let weights = mined.iter().map(|node| node.weight).collect::<Vec<_>>();
        assert_eq!(weights, [7.0, 6.0, 5.0]);
    }

    #[test]
    fn option_list_weight_never_drops_below_one() {
        let mut mined = Vec::new();
        mine_message("[OPTIONS: a | b | c | d | e | f | g | h | i]", &mut mined);
        assert!(mined.iter().all(|node| node.weight >= 1.0));
        assert_eq!(mined.last().map(|node| node.weight), Some(1.0));
    }

    #[test]
    fn risk_header_is_a_con() {
        let root = extract(&[
            ChatMessage::user("Should I invest?"),
            ChatMessage::model("**Risk Factors:** volatility."),
        ]);
        let node = &topic_children(&root)[0];
        assert_eq!(node.name, "Risk Factors");
        assert_eq!(node.kind, NodeKind::Con);
    }

    #[test]
    fn disadvantage_header_is_not_mistaken_for_a_pro() {
        assert_eq!(classify_header("Disadvantages"), NodeKind::Con);
        assert_eq!(classify_header("Key Benefits"), NodeKind::Pro);
        assert_eq!(classify_header("Timeline"), NodeKind::Option);
    }

    #[test]
    fn switch_jobs_scenario() {
        let root = extract(&[
            ChatMessage::user("Should I switch jobs?"),
            ChatMessage::model(
                "**Pros:** Better pay. **Cons:** Relocation. [OPTIONS: Stay | Switch | Negotiate]",
            ),
        ]);

        assert_eq!(root.children[0].name, "Switch jobs");
        let children = topic_children(&root);
        let find = |name: &str| {
            children
                .iter()
                .find(|node| node.name == name)
                .unwrap_or_else(|| panic!("missing {name}"))
        };

        assert_eq!(find("Pros").kind, NodeKind::Pro);
        assert_eq!(find("Cons").kind, NodeKind::Con);
        assert_eq!(find("Stay").weight, 10.0);
        assert!(find("Stay").is_recommendation);
        assert_eq!(find("Switch").weight, 6.0);
        assert_eq!(find("Negotiate").weight, 5.0);

        let recommended = children
            .iter()
            .filter(|node| node.is_recommendation)
            .collect::<Vec<_>>();
        assert_eq!(recommended.len(), 1);
        assert_eq!(recommended[0].weight, 10.0);
    }

    #[test]
    fn recommendation_promotes_matching_node() {
        let root = extract(&[
            ChatMessage::user("Help me choose a laptop"),
            ChatMessage::model("[OPTIONS: MacBook Air | ThinkPad X1]\nI recommend the ThinkPad X1."),
        ]);
        let children = topic_children(&root);
        let thinkpad = children.iter().find(|node| node.name == "ThinkPad X1").unwrap();
        let macbook = children.iter().find(|node| node.name == "MacBook Air").unwrap();
        assert!(thinkpad.is_recommendation);
        assert_eq!(thinkpad.weight, 10.0);
        assert!(!macbook.is_recommendation);
        assert_eq!(root.children[0].name, "A laptop");
    }

    #[test]
    fn later_recommendation_replaces_the_earlier_one() {
        let root = extract(&[
            ChatMessage::user("Help me choose a laptop"),
            ChatMessage::model("[OPTIONS: MacBook Air | ThinkPad X1]\nI recommend the MacBook Air."),
            ChatMessage::user("What about battery life?"),
            ChatMessage::model("Given that, I suggest the ThinkPad X1."),
        ]);
        let children = topic_children(&root);
        let recommended = children
            .iter()
            .filter(|node| node.is_recommendation)
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(recommended, ["ThinkPad X1"]);

        let macbook = children.iter().find(|node| node.name == "MacBook Air").unwrap();
        assert_eq!(macbook.weight, 7.0);
    }

    #[test]
    fn unmatched_recommendation_becomes_new_option() {
        let mut mined = Vec::new();
        mine_message("My choice: Remote work", &mut mined);
        assert_eq!(mined.len(), 1);
        assert_eq!(mined[0].name, "Remote work");
        assert_eq!(mined[0].kind, NodeKind::Option);
        assert!(mined[0].is_recommendation);
    }

    #[test]
    fn bullets_and_numbered_items_are_filtered() {
        let text = "\
- Rent downtown
- this one is lowercase
- Far too many words in this bullet line here
* Buy
1. **Lease a car** - cheaper monthly
2. Keep the old car
3. An extremely long numbered item that goes on and on
- Rent downtown";
        let mut mined = Vec::new();
        mine_message(text, &mut mined);

        let names = mined
            .iter()
            .map(|node| (node.name.as_str(), node.weight))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                ("Rent downtown", 5.0),
                ("Buy", 5.0),
                ("Lease a car", 6.0),
                ("Keep the old car", 6.0),
            ]
        );
    }

    #[test]
    fn headers_deduplicate_within_one_message_only() {
        let mut mined = Vec::new();
        mine_message("**Budget:** tight. **Budget:** again.", &mut mined);
        mine_message("**Budget:** still tight.", &mut mined);
        assert_eq!(mined.len(), 2);
    }

    #[test]
    fn topic_fallback_truncates() {
        assert_eq!(extract_topic("Thinking about things"), "Thinking about things");
        assert_eq!(
            extract_topic("Supercalifragilistic expialidocious considerations everywhere today"),
            "Supercalifragilistic expialido..."
        );
        assert_eq!(extract_topic("I'm choosing between Rust and Go."), "Rust and Go");
        assert_eq!(extract_topic("What laptop should a student get"), "Laptop");
    }

    #[test]
    fn extraction_is_reproducible() {
        let messages = [
            ChatMessage::user("Should I switch jobs?"),
            ChatMessage::model("**Pros:** Better pay. [OPTIONS: Stay | Switch]"),
        ];
        assert_eq!(extract(&messages), extract(&messages));
    }
}
