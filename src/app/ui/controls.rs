use std::collections::HashSet;

use eframe::egui::{self, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::LayoutMode;

use super::super::ViewModel;

const SEARCH_RESULT_ROWS: usize = 8;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Node ids whose names fuzzily match `query`, best first.
fn ranked_matches<'a>(
    names: impl Iterator<Item = (&'a str, &'a str)>,
    query: &str,
) -> Vec<(String, String)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = names
        .filter_map(|(id, name)| {
            fuzzy_match_score(&matcher, name, query)
                .map(|score| (score, id.to_owned(), name.to_owned()))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.2.cmp(&b.2)));
    scored
        .into_iter()
        .map(|(_, id, name)| (id, name))
        .collect()
}

impl ViewModel {
    fn ranked_search_matches(&self) -> Vec<(String, String)> {
        let names = self
            .session
            .layout()
            .registry()
            .nodes()
            .iter()
            .map(|node| (node.meta.id.as_str(), node.meta.name.as_str()));
        ranked_matches(names, &self.search)
    }

    pub(in crate::app) fn search_matches(&self) -> HashSet<String> {
        self.ranked_search_matches()
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Canvas Controls");
        ui.add_space(4.0);

        let mut mode = self.session.layout().mode();
        ui.horizontal(|ui| {
            ui.selectable_value(&mut mode, LayoutMode::Organic, LayoutMode::Organic.label())
                .on_hover_text("Free-floating physics.");
            ui.selectable_value(&mut mode, LayoutMode::Organized, LayoutMode::Organized.label())
                .on_hover_text("Pull nodes into a left-to-right tree.");
        });
        if mode != self.session.layout().mode() {
            self.set_mode(mode);
        }

        ui.horizontal(|ui| {
            ui.checkbox(&mut self.live_physics, "Live physics")
                .on_hover_text("Keep simulating layout forces every frame.");
            if ui
                .button("Reheat")
                .on_hover_text("Restart the simulation from a warm state.")
                .clicked()
            {
                self.session.layout_mut().reheat(1.0);
            }
        });

        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the Barnes-Hut partitions over the canvas.");

        ui.collapsing("Physics tuning", |ui| {
            let mut changed = false;
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.charge_scale, 0.2..=3.0)
                        .text("Repulsion")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly nodes push away from each other.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.link_scale, 0.0..=2.0)
                        .text("Link strength")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly linked nodes keep their preferred distance.")
                .changed();
            if changed {
                self.apply_physics_scales();
            }
        });

        ui.separator();
        ui.label("Search nodes");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Fuzzy-highlight matching nodes; click a result to select it.");

        let matches = self.ranked_search_matches();
        if !self.search.trim().is_empty() && matches.is_empty() {
            ui.label("No matching nodes.");
        }
        let mut clicked = None;
        for (id, name) in matches.iter().take(SEARCH_RESULT_ROWS) {
            let selected = self.selected.as_deref() == Some(id.as_str());
            if ui.selectable_label(selected, name.as_str()).clicked() {
                clicked = Some(id.clone());
            }
        }
        if let Some(id) = clicked {
            self.set_selected(Some(id));
        }
    }
}
