use eframe::egui::{self, Color32, RichText, Ui};

use crate::structure::{
    AnalysisKind, Comparison, CostBenefit, DecisionNode, DecisionTree, ProjectionSeries, Swot,
    Timeline,
};

use super::super::ViewModel;

fn empty_state(ui: &mut Ui, kind: AnalysisKind) {
    ui.label(
        RichText::new(format!("No {} available.", kind.label().to_lowercase()))
            .italics()
            .color(Color32::GRAY),
    );
}

fn bullet_list(ui: &mut Ui, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    ui.label(RichText::new(heading).strong());
    for item in items {
        ui.label(format!("• {item}"));
    }
}

fn draw_projection(ui: &mut Ui, series: &[ProjectionSeries]) {
    for line in series {
        ui.label(RichText::new(line.name.as_str()).strong());
        if !line.description.is_empty() {
            ui.small(line.description.as_str());
        }
        let points = line
            .data
            .iter()
            .map(|point| format!("{} {:.0}", point.time_label, point.value))
            .collect::<Vec<_>>()
            .join("  →  ");
        ui.label(points);
        ui.add_space(4.0);
    }
}

fn draw_comparison(ui: &mut Ui, comparison: &Comparison) {
    egui::Grid::new("comparison_grid")
        .striped(true)
        .show(ui, |ui| {
            ui.label(RichText::new("Option").strong());
            for criterion in &comparison.criteria {
                ui.label(RichText::new(criterion.as_str()).strong());
            }
            ui.end_row();

            for row in &comparison.rows {
                let name = if row.is_recommended {
                    RichText::new(format!("★ {}", row.option_name)).color(Color32::from_rgb(250, 204, 21))
                } else {
                    RichText::new(row.option_name.as_str())
                };
                ui.label(name).on_hover_text(row.summary.as_str());
                for criterion in &comparison.criteria {
                    let score = row
                        .scores
                        .iter()
                        .find(|score| &score.criteria == criterion)
                        .map_or_else(|| "-".to_owned(), |score| format!("{:.0}", score.score));
                    ui.label(score);
                }
                ui.end_row();
            }
        });
}

fn draw_decision_node(ui: &mut Ui, node: &DecisionNode) {
    let mut label = format!("{} ({:?})", node.label, node.kind);
    if let Some(probability) = node.probability {
        label.push_str(&format!("  p={probability:.2}"));
    }
    if let Some(value) = node.value {
        label.push_str(&format!("  value {value:.0}"));
    }

    if node.children.is_empty() {
        ui.label(label);
        return;
    }

    let id = ui.make_persistent_id(("decision-node", node.id.as_str(), node.label.as_str()));
    egui::collapsing_header::CollapsingState::load_with_default_open(ui.ctx(), id, true)
        .show_header(ui, |ui| ui.label(label))
        .body(|ui| {
            for child in &node.children {
                draw_decision_node(ui, child);
            }
        });
}

fn draw_decision_tree(ui: &mut Ui, tree: &DecisionTree) {
    draw_decision_node(ui, &tree.root);
    if let Some(recommendation) = &tree.recommendation {
        ui.add_space(4.0);
        ui.label(format!("Recommendation: {recommendation}"));
    }
}

fn draw_swot(ui: &mut Ui, swot: &Swot) {
    for option in &swot.options {
        let mut heading = option.option_name.clone();
        if let Some(score) = option.overall_score {
            heading.push_str(&format!(" ({score:.0})"));
        }
        ui.label(RichText::new(heading).strong().size(14.0));
        bullet_list(ui, "Strengths", &option.strengths);
        bullet_list(ui, "Weaknesses", &option.weaknesses);
        bullet_list(ui, "Opportunities", &option.opportunities);
        bullet_list(ui, "Threats", &option.threats);
        ui.add_space(6.0);
    }
    if let Some(recommended) = &swot.recommended_option {
        ui.label(format!("Recommended: {recommended}"));
    }
}

fn draw_cost_benefit(ui: &mut Ui, analysis: &CostBenefit) {
    for option in &analysis.options {
        ui.label(
            RichText::new(format!("{}  (net {:+.1})", option.option_name, option.net_score)).strong(),
        );
        for cost in &option.costs {
            ui.label(format!("− {} [{:.0}]", cost.description, cost.magnitude));
        }
        for benefit in &option.benefits {
            ui.label(format!("+ {} [{:.0}]", benefit.description, benefit.magnitude));
        }
        if let Some(recommendation) = &option.recommendation {
            ui.small(recommendation.as_str());
        }
        ui.add_space(6.0);
    }
    if let Some(best) = &analysis.best_option {
        ui.label(format!("Best option: {best}"));
    }
}

fn draw_timeline(ui: &mut Ui, timeline: &Timeline) {
    if !timeline.time_horizon.is_empty() {
        ui.small(format!("Horizon: {}", timeline.time_horizon));
    }
    for milestone in &timeline.milestones {
        let mut line = format!("{}  {}", milestone.date, milestone.label);
        if !milestone.option_name.is_empty() {
            line.push_str(&format!("  [{}]", milestone.option_name));
        }
        ui.label(line)
            .on_hover_text(milestone.description.as_deref().unwrap_or(milestone.kind.as_str()));
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_analysis(&mut self, ui: &mut Ui) {
        ui.heading("Analysis");
        ui.add_space(4.0);

        if self.analysis_pending {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Running analyses...");
            });
        }
        if let Some(error) = &self.analysis_error {
            ui.colored_label(Color32::from_rgb(248, 113, 113), error.as_str());
        }

        let bundle = self.analysis.as_ref();
        for kind in AnalysisKind::FULL_ANALYSIS {
            egui::CollapsingHeader::new(kind.label())
                .default_open(false)
                .show(ui, |ui| match kind {
                    AnalysisKind::Projection => match bundle.and_then(|b| b.projection.as_deref()) {
                        Some(series) => draw_projection(ui, series),
                        None => empty_state(ui, kind),
                    },
                    AnalysisKind::Comparison => match bundle.and_then(|b| b.comparison.as_ref()) {
                        Some(comparison) => draw_comparison(ui, comparison),
                        None => empty_state(ui, kind),
                    },
                    AnalysisKind::DecisionTree => {
                        match bundle.and_then(|b| b.decision_tree.as_ref()) {
                            Some(tree) => draw_decision_tree(ui, tree),
                            None => empty_state(ui, kind),
                        }
                    }
                    AnalysisKind::Swot => match bundle.and_then(|b| b.swot.as_ref()) {
                        Some(swot) => draw_swot(ui, swot),
                        None => empty_state(ui, kind),
                    },
                    AnalysisKind::CostBenefit => match bundle.and_then(|b| b.cost_benefit.as_ref()) {
                        Some(analysis) => draw_cost_benefit(ui, analysis),
                        None => empty_state(ui, kind),
                    },
                    AnalysisKind::Timeline => match bundle.and_then(|b| b.timeline.as_ref()) {
                        Some(timeline) => draw_timeline(ui, timeline),
                        None => empty_state(ui, kind),
                    },
                    AnalysisKind::MindMap => {}
                });
        }
    }
}
