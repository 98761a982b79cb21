use eframe::egui::{self, Color32, Key, RichText, Ui};

use crate::conversation::{ChatMessage, Role};

use super::super::{Request, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_chat(&mut self, ui: &mut Ui) {
        ui.heading("Conversation");
        ui.separator();

        let composer_height = 120.0;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .max_height((ui.available_height() - composer_height).max(80.0))
            .show(ui, |ui| {
                if self.session.messages().is_empty() {
                    ui.label("Describe a decision you are weighing.");
                }
                for message in self.session.messages() {
                    let (speaker, color) = match message.role {
                        Role::User => ("You", Color32::from_rgb(147, 197, 253)),
                        Role::Model => ("Assistant", Color32::from_rgb(167, 243, 208)),
                    };
                    ui.label(RichText::new(speaker).strong().color(color));
                    ui.label(message.text.as_str());
                    ui.add_space(8.0);
                }
                if self.chat_pending {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Thinking...");
                    });
                }
                if let Some(error) = &self.chat_error {
                    ui.colored_label(Color32::from_rgb(248, 113, 113), format!("Reply failed: {error}"));
                }
            });

        ui.separator();
        let input = ui.add(
            egui::TextEdit::multiline(&mut self.draft)
                .desired_rows(3)
                .desired_width(f32::INFINITY)
                .hint_text("Type a message (Ctrl+Enter to send)"),
        );
        let shortcut = input.has_focus()
            && ui.input(|input| input.key_pressed(Key::Enter) && input.modifiers.command);

        let mut send = false;
        ui.horizontal(|ui| {
            send = ui
                .add_enabled(!self.chat_pending, egui::Button::new("Send"))
                .clicked();
            ui.checkbox(&mut self.paste_as_assistant, "As assistant")
                .on_hover_text("Add the text as an assistant reply, for pasting answers from elsewhere.");
            if ui
                .add_enabled(
                    self.is_online() && !self.analysis_pending && !self.session.messages().is_empty(),
                    egui::Button::new("Analyze"),
                )
                .on_hover_text("Generate the six structured analyses for this conversation.")
                .clicked()
            {
                self.pending_requests.push(Request::FullAnalysis);
            }
        });

        if (send || shortcut) && !self.chat_pending {
            let text = self.draft.trim().to_owned();
            if !text.is_empty() {
                self.draft.clear();
                let message = if self.paste_as_assistant {
                    ChatMessage::model(text)
                } else {
                    ChatMessage::user(text)
                };
                self.submit_message(message);
            }
        }
    }
}
