use eframe::egui::{self, Align, Context, Layout};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, is_busy: bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("decision-canvas");
                    ui.separator();
                    ui.label(format!("topic: {}", self.topic_label()));
                    ui.label(format!("nodes: {}", self.session.layout().registry().len()));
                    ui.label(format!("mode: {}", self.session.layout().mode().label()));
                    if let Some(reason) = &self.offline_reason {
                        ui.colored_label(egui::Color32::from_rgb(251, 191, 36), "offline")
                            .on_hover_text(reason.as_str());
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!("alpha {:.3}", self.session.layout().alpha()));
                        if let Some(report) = self.last_tick
                            && report.running
                        {
                            ui.label(format!("energy {:.1}", report.kinetic_energy));
                        }
                        if is_busy {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("chat")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_chat(ui));

        egui::SidePanel::right("inspector")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_controls(ui);
                    ui.separator();
                    self.draw_details(ui);
                    ui.separator();
                    self.draw_analysis(ui);
                });
            });

        let search_matches = self.search_matches();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let mut supervisor = std::mem::take(&mut self.supervisor);
                let was_healthy = supervisor.failure().is_none();
                let rendered = supervisor.guard(|| self.draw_canvas(ui, &search_matches));
                if rendered.is_none() {
                    if was_healthy {
                        self.reset_view();
                    }
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("The canvas failed to render");
                        ui.add_space(6.0);
                        ui.label(supervisor.failure().unwrap_or_default());
                        ui.add_space(10.0);
                        if ui.button("Retry").clicked() {
                            supervisor.retry();
                        }
                    });
                }
                self.supervisor = supervisor;
            });
    }

    fn topic_label(&self) -> &str {
        self.session
            .tree()
            .children
            .first()
            .map_or(self.session.tree().name.as_str(), |topic| topic.name.as_str())
    }
}
