use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

impl ViewModel {
    pub(in crate::app) fn handle_canvas_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.15, 4.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_canvas_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn hovered_index(&self, pointer: Option<Pos2>) -> Option<usize> {
        let positions = &self.view_scratch.screen_positions;
        let radii = &self.view_scratch.screen_radii;
        pointer.and_then(|pointer| {
            (0..positions.len())
                .filter_map(|index| {
                    let distance = positions[index].distance(pointer);
                    (distance <= radii[index]).then_some((index, distance))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index)
        })
    }

    /// Primary drag on a node pins it under the pointer; releasing unpins.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(index) = hovered
        {
            let id = self.session.layout().registry().nodes()[index].meta.id.clone();
            self.session.layout_mut().begin_drag(&id);
        }

        let Some(id) = self.session.layout().dragging().map(str::to_owned) else {
            return;
        };

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            self.session.layout_mut().drag_to(&id, world);
        }

        if response.drag_stopped() {
            self.session.layout_mut().end_drag(&id);
        }
    }

    pub(in crate::app) fn apply_canvas_selection(&mut self, selected: Option<String>) {
        self.set_selected(selected);
    }
}
