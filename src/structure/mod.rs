mod collaborator;
mod decode;
mod prompts;
mod shapes;

use std::thread;

use log::{info, warn};
use thiserror::Error;

use crate::conversation::ChatMessage;
use crate::mindmap::MindMapNode;

pub use collaborator::{Collaborator, HttpCollaborator, HttpSettings, TransportError};
pub use decode::ParseError;
pub use shapes::{
    Comparison, CostBenefit, DecisionNode, DecisionTree, ProjectionSeries, Swot, Timeline,
};

use decode::{clean_and_parse_json, parse_shape};
use prompts::{chat_prompt, structuring_prompt};

/// Default reply budget for chat turns.
pub const CHAT_MAX_TOKENS: u32 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    MindMap,
    Projection,
    Comparison,
    DecisionTree,
    Swot,
    CostBenefit,
    Timeline,
}

impl AnalysisKind {
    /// The kinds a full analysis run generates. The mind map has its own
    /// background path.
    pub const FULL_ANALYSIS: [AnalysisKind; 6] = [
        Self::Projection,
        Self::Comparison,
        Self::DecisionTree,
        Self::Swot,
        Self::CostBenefit,
        Self::Timeline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::MindMap => "Mind map",
            Self::Projection => "Projection",
            Self::Comparison => "Comparison",
            Self::DecisionTree => "Decision tree",
            Self::Swot => "SWOT",
            Self::CostBenefit => "Cost-benefit",
            Self::Timeline => "Timeline",
        }
    }

    fn max_tokens(self) -> u32 {
        match self {
            Self::MindMap | Self::Comparison | Self::Swot => 2048,
            Self::DecisionTree | Self::CostBenefit | Self::Timeline => 3072,
            Self::Projection => 1536,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{0} response had no usable content")]
    Empty(&'static str),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("all {0} analysis generations failed")]
    AllGenerationsFailed(usize),
}

fn generate_raw(
    collaborator: &dyn Collaborator,
    kind: AnalysisKind,
    messages: &[ChatMessage],
) -> Result<String, TransportError> {
    collaborator.generate(&structuring_prompt(kind, messages), kind.max_tokens())
}

pub fn generate_mind_map(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<MindMapNode, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::MindMap, messages)?;
    let value = clean_and_parse_json(&raw)?;
    MindMapNode::from_value(&value).ok_or(GenerationError::Empty(AnalysisKind::MindMap.label()))
}

pub fn generate_projection(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<Vec<ProjectionSeries>, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::Projection, messages)?;
    Ok(parse_shape(&raw)?)
}

pub fn generate_comparison(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<Comparison, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::Comparison, messages)?;
    Ok(parse_shape(&raw)?)
}

pub fn generate_decision_tree(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<DecisionTree, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::DecisionTree, messages)?;
    Ok(parse_shape(&raw)?)
}

pub fn generate_swot(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<Swot, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::Swot, messages)?;
    Ok(parse_shape(&raw)?)
}

pub fn generate_cost_benefit(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<CostBenefit, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::CostBenefit, messages)?;
    Ok(parse_shape(&raw)?)
}

pub fn generate_timeline(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<Timeline, GenerationError> {
    let raw = generate_raw(collaborator, AnalysisKind::Timeline, messages)?;
    Ok(parse_shape(&raw)?)
}

#[derive(Clone, Debug, Default)]
pub struct AnalysisBundle {
    pub projection: Option<Vec<ProjectionSeries>>,
    pub comparison: Option<Comparison>,
    pub decision_tree: Option<DecisionTree>,
    pub swot: Option<Swot>,
    pub cost_benefit: Option<CostBenefit>,
    pub timeline: Option<Timeline>,
}

impl AnalysisBundle {
    pub fn populated_count(&self) -> usize {
        [
            self.projection.is_some(),
            self.comparison.is_some(),
            self.decision_tree.is_some(),
            self.swot.is_some(),
            self.cost_benefit.is_some(),
            self.timeline.is_some(),
        ]
        .into_iter()
        .filter(|populated| *populated)
        .count()
    }
}

/// Converts one generation outcome into an optional result, treating empty
/// payloads as failures.
fn settle<T>(
    kind: AnalysisKind,
    result: thread::Result<Result<T, GenerationError>>,
    is_empty: impl FnOnce(&T) -> bool,
) -> Option<T> {
    match result {
        Ok(Ok(value)) if !is_empty(&value) => Some(value),
        Ok(Ok(_)) => {
            warn!("{} generation returned an empty structure", kind.label());
            None
        }
        Ok(Err(error)) => {
            if let GenerationError::Parse(parse) = &error {
                warn!(
                    "{} generation failed: {error}; raw response: {:.200}",
                    kind.label(),
                    parse.raw()
                );
            } else {
                warn!("{} generation failed: {error}", kind.label());
            }
            None
        }
        Err(_) => {
            warn!("{} generation worker panicked", kind.label());
            None
        }
    }
}

/// Runs every analysis generation concurrently. Individual failures are
/// logged and leave their slot empty; only a run where nothing succeeded is
/// an error.
pub fn run_full_analysis(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
) -> Result<AnalysisBundle, AnalysisError> {
    let bundle = thread::scope(|scope| {
        let projection = scope.spawn(|| generate_projection(collaborator, messages));
        let comparison = scope.spawn(|| generate_comparison(collaborator, messages));
        let decision_tree = scope.spawn(|| generate_decision_tree(collaborator, messages));
        let swot = scope.spawn(|| generate_swot(collaborator, messages));
        let cost_benefit = scope.spawn(|| generate_cost_benefit(collaborator, messages));
        let timeline = scope.spawn(|| generate_timeline(collaborator, messages));

        AnalysisBundle {
            projection: settle(AnalysisKind::Projection, projection.join(), |series| {
                series.is_empty()
            }),
            comparison: settle(AnalysisKind::Comparison, comparison.join(), Comparison::is_empty),
            decision_tree: settle(
                AnalysisKind::DecisionTree,
                decision_tree.join(),
                DecisionTree::is_empty,
            ),
            swot: settle(AnalysisKind::Swot, swot.join(), Swot::is_empty),
            cost_benefit: settle(
                AnalysisKind::CostBenefit,
                cost_benefit.join(),
                CostBenefit::is_empty,
            ),
            timeline: settle(AnalysisKind::Timeline, timeline.join(), Timeline::is_empty),
        }
    });

    let populated = bundle.populated_count();
    if populated == 0 {
        return Err(AnalysisError::AllGenerationsFailed(
            AnalysisKind::FULL_ANALYSIS.len(),
        ));
    }

    info!(
        "full analysis finished with {populated}/{} results",
        AnalysisKind::FULL_ANALYSIS.len()
    );
    Ok(bundle)
}

pub fn generate_chat_reply(
    collaborator: &dyn Collaborator,
    messages: &[ChatMessage],
    max_tokens: u32,
) -> Result<String, TransportError> {
    collaborator.generate(&chat_prompt(messages), max_tokens)
}
