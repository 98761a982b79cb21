use eframe::egui::{self, RichText, Ui};

use crate::mindmap::MindMapNode;

use super::super::{RenameDraft, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a node on the canvas or from the search results.");
            return;
        };

        let Some(node) = self.session.tree().find(&selected_id).cloned() else {
            ui.label("Selected node no longer exists in the mind map.");
            return;
        };

        let registry = self.session.layout().registry();
        let sim = registry.get(&selected_id);
        let depth = sim.map(|sim| sim.meta.depth);
        let pinned = sim.is_some_and(|sim| sim.body.pin.is_some());
        let parent_name = sim
            .and_then(|sim| sim.parent)
            .and_then(|parent| registry.nodes().get(parent))
            .map(|parent| parent.meta.name.clone());

        ui.label(RichText::new(node.name.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Kind: {}", node.kind.label()));
        ui.label(format!("Weight: {:.1}", node.weight));
        ui.label(format!("Children: {}", node.children.len()));
        if let Some(depth) = depth {
            ui.label(format!("Depth: {depth}"));
        }
        if let Some(parent_name) = parent_name {
            ui.label(format!("Parent: {parent_name}"));
        }
        if node.is_recommendation {
            ui.label(RichText::new("Recommended").color(egui::Color32::from_rgb(250, 204, 21)));
        }
        if pinned {
            ui.label("Pinned while dragged");
        }

        ui.separator();
        ui.label(RichText::new("Edit").strong());

        if self
            .rename_draft
            .as_ref()
            .is_none_or(|draft| draft.node_id != node.id)
        {
            self.rename_draft = Some(RenameDraft {
                node_id: node.id.clone(),
                name: node.name.clone(),
                weight: node.weight,
                is_recommendation: node.is_recommendation,
            });
        }
        let Some(draft) = self.rename_draft.as_mut() else {
            return;
        };

        ui.text_edit_singleline(&mut draft.name);
        ui.add(egui::Slider::new(&mut draft.weight, 1.0..=10.0).text("Weight"));
        ui.checkbox(&mut draft.is_recommendation, "Recommendation");

        let dirty = draft.name.trim() != node.name
            || (draft.weight - node.weight).abs() > f32::EPSILON
            || draft.is_recommendation != node.is_recommendation;
        let valid = !draft.name.trim().is_empty();

        let mut apply = false;
        let mut revert = false;
        ui.horizontal(|ui| {
            apply = ui
                .add_enabled(dirty && valid, egui::Button::new("Apply"))
                .clicked();
            revert = ui.add_enabled(dirty, egui::Button::new("Revert")).clicked();
        });

        if apply {
            let updated = MindMapNode {
                name: draft.name.trim().to_owned(),
                weight: draft.weight,
                is_recommendation: draft.is_recommendation,
                children: Vec::new(),
                ..node
            };
            self.on_node_update(updated);
        } else if revert {
            self.rename_draft = None;
        }
    }
}
