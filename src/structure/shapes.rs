//! Wire shapes returned by the structuring collaborator.
//!
//! Every field is defaulted: the decoder casts, it does not validate, and the
//! panels render whatever subset arrived.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionSeries {
    pub name: String,
    pub description: String,
    pub data: Vec<ProjectionPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub time_label: String,
    /// 0..=100
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comparison {
    pub criteria: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparisonRow {
    pub option_name: String,
    pub is_recommended: bool,
    pub summary: String,
    pub scores: Vec<CriterionScore>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CriterionScore {
    pub criteria: String,
    pub score: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecisionTree {
    pub root: DecisionNode,
    pub recommendation: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionNodeKind {
    #[default]
    Decision,
    Chance,
    Outcome,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecisionNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: DecisionNodeKind,
    pub probability: Option<f64>,
    pub value: Option<f64>,
    pub sentiment: Option<String>,
    pub children: Vec<DecisionNode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Swot {
    pub options: Vec<SwotOption>,
    pub recommended_option: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwotOption {
    pub option_name: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
    pub overall_score: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostBenefit {
    pub options: Vec<CostBenefitOption>,
    pub best_option: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostBenefitOption {
    pub option_name: String,
    pub costs: Vec<CostBenefitItem>,
    pub benefits: Vec<CostBenefitItem>,
    pub net_score: f64,
    pub recommendation: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostBenefitItem {
    pub id: String,
    pub category: String,
    pub description: String,
    /// 1..=10
    pub magnitude: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timeline {
    pub milestones: Vec<Milestone>,
    pub options: Vec<String>,
    pub time_horizon: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub date: String,
    pub label: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub option_id: String,
    pub option_name: String,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl DecisionTree {
    pub fn is_empty(&self) -> bool {
        self.root.label.is_empty() && self.root.children.is_empty()
    }
}

impl Swot {
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl CostBenefit {
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }
}
