use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::physics::{EXIT_SECONDS, node_radius};
use crate::util::truncate_label;

use super::super::ViewModel;
use super::super::render_utils::{
    LABEL_MAX_CHARS, LinkPath, blend_color, circle_visible, draw_background, entry_progress,
    kind_color, label_offset, screen_radius, with_alpha, world_to_screen,
};

impl ViewModel {
    fn update_screen_space(&mut self, rect: egui::Rect) {
        let registry = self.session.layout().registry();
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in registry.nodes() {
            scratch
                .screen_positions
                .push(world_to_screen(rect, self.pan, self.zoom, node.body.pos));
            let grow = 0.35 + 0.65 * entry_progress(node.age);
            scratch
                .screen_radii
                .push(screen_radius(node_radius(node.meta.weight), self.zoom) * grow);
        }
    }

    /// Draws one frame of the mind map and advances the simulation.
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, search_matches: &HashSet<String>) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_canvas_zoom(ui, rect, &response);
        self.handle_canvas_pan(&response);

        let dt = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let mut animating = false;
        if self.live_physics {
            let report = self.session.layout_mut().tick(dt);
            animating = report.running;
            self.last_tick = Some(report);
        }
        animating |= !self.session.layout().exiting().is_empty();

        self.update_screen_space(rect);
        let hovered = self.hovered_index(ui.input(|input| input.pointer.hover_pos()));
        self.handle_node_drag(rect, &response, hovered);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        if self.show_quadtree_overlay {
            self.session
                .layout()
                .quadtree_cells(&mut self.view_scratch.quadtree_cells);
            for cell in &self.view_scratch.quadtree_cells {
                let min = world_to_screen(
                    rect,
                    self.pan,
                    self.zoom,
                    cell.center - vec2(cell.half_extent, cell.half_extent),
                );
                let max = world_to_screen(
                    rect,
                    self.pan,
                    self.zoom,
                    cell.center + vec2(cell.half_extent, cell.half_extent),
                );
                let alpha = if cell.is_leaf { 110 } else { 55 };
                let width = (1.4 - (cell.depth as f32 * 0.09)).clamp(0.45, 1.4);
                painter.rect_stroke(
                    egui::Rect::from_min_max(min, max),
                    0.0,
                    Stroke::new(width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
                    egui::StrokeKind::Inside,
                );
            }
        }

        let layout = self.session.layout();
        let registry = layout.registry();
        let positions = &self.view_scratch.screen_positions;
        let radii = &self.view_scratch.screen_radii;
        let zoom_sqrt = self.zoom.sqrt();
        let time = ui.input(|input| input.time) as f32;

        for &(parent, child) in registry.links() {
            let child_node = &registry.nodes()[child];
            let fade = entry_progress(child_node.age);
            let color = with_alpha(Color32::from_rgba_unmultiplied(140, 150, 180, 150), fade);
            let stroke = Stroke::new((1.4 * zoom_sqrt).clamp(0.6, 3.0), color);
            LinkPath::between(layout.mode(), positions[parent], positions[child])
                .draw(&painter, stroke);
        }

        for exiting in layout.exiting() {
            let progress = (exiting.remaining / EXIT_SECONDS).clamp(0.0, 1.0);
            let position = world_to_screen(rect, self.pan, self.zoom, exiting.pos);
            let radius = screen_radius(node_radius(exiting.meta.weight), self.zoom) * progress;
            if radius > 0.5 && circle_visible(rect, position, radius) {
                painter.circle_filled(
                    position,
                    radius,
                    with_alpha(kind_color(exiting.meta.kind), progress),
                );
            }
        }

        let search_active = !search_matches.is_empty();
        for (index, node) in registry.nodes().iter().enumerate() {
            let position = positions[index];
            let radius = radii[index];
            if !circle_visible(rect, position, radius + 24.0) {
                continue;
            }

            let is_selected = self.selected.as_deref() == Some(node.meta.id.as_str());
            let is_hovered = hovered == Some(index);
            let is_match = search_matches.contains(&node.meta.id);

            let entry = entry_progress(node.age);
            if entry < 1.0 {
                animating = true;
                let burst = radius + entry * 22.0 * zoom_sqrt;
                painter.circle_stroke(
                    position,
                    burst,
                    Stroke::new(2.0, with_alpha(kind_color(node.meta.kind), 1.0 - entry)),
                );
            }

            if node.meta.is_recommendation {
                animating = true;
                let pulse = 0.5 + 0.5 * (time * 2.4).sin();
                painter.circle_filled(
                    position,
                    radius + 6.0 + pulse * 5.0,
                    Color32::from_rgba_unmultiplied(250, 204, 21, (30.0 + pulse * 40.0) as u8),
                );
            }

            let base = kind_color(node.meta.kind);
            let color = if is_hovered {
                blend_color(base, Color32::WHITE, 0.3)
            } else if search_active && !is_match {
                with_alpha(base, 0.35)
            } else {
                base
            };
            painter.circle_filled(position, radius, with_alpha(color, 0.4 + 0.6 * entry));

            let outline = if is_selected {
                Stroke::new(2.5, Color32::from_rgb(245, 206, 93))
            } else if is_match {
                Stroke::new(2.0, Color32::from_rgb(103, 196, 255))
            } else if node.body.pin.is_some() {
                Stroke::new(1.6, Color32::WHITE)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, outline);
            if node.meta.collapsed {
                let arm = (radius * 0.45).max(2.0);
                let stroke = Stroke::new(1.5, Color32::from_gray(20));
                painter.line_segment([position - vec2(arm, 0.0), position + vec2(arm, 0.0)], stroke);
                painter.line_segment([position - vec2(0.0, arm), position + vec2(0.0, arm)], stroke);
            }

            let show_label = is_selected || is_hovered || is_match || self.zoom > 0.45;
            if show_label {
                painter.text(
                    position + label_offset(radius),
                    Align2::CENTER_TOP,
                    truncate_label(&node.meta.name, LABEL_MAX_CHARS),
                    FontId::proportional((12.0 * zoom_sqrt).clamp(9.0, 16.0)),
                    with_alpha(Color32::from_gray(235), entry),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &registry.nodes()[index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  weight {:.1}",
                    node.meta.name,
                    node.meta.kind.label(),
                    node.meta.weight
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        let pending_selection = response
            .clicked_by(egui::PointerButton::Primary)
            .then(|| hovered.map(|index| registry.nodes()[index].meta.id.clone()));

        if animating || response.dragged() {
            ui.ctx().request_repaint();
        }

        if let Some(selected) = pending_selection {
            self.apply_canvas_selection(selected);
        }
    }
}
