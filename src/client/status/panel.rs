use super::StatusSummary;

/// What the user asked for from the status panel this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelAction {
    pub sync_now: bool,
    pub toggle_visibility: bool,
}

pub fn render_status_panel(ui: &mut egui::Ui, summary: &StatusSummary, visible: bool) -> PanelAction {
    let mut action = PanelAction::default();

    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            ui.heading("Offline Sync");

            if ui.button(if visible { "Hide" } else { "Show" }).clicked() {
                action.toggle_visibility = true;
            }

            let sync_button = ui.add_enabled(
                summary.is_online && !summary.sync_in_progress,
                egui::Button::new("🔄 Sync now"),
            );
            if sync_button.clicked() {
                action.sync_now = true;
            }
        });
        ui.separator();

        if !visible {
            return;
        }

        ui.horizontal(|ui| {
            if summary.is_online {
                ui.colored_label(egui::Color32::GREEN, "● Online");
            } else {
                ui.colored_label(egui::Color32::YELLOW, "● Offline");
            }

            if summary.sync_in_progress {
                ui.spinner();
                ui.label("Syncing...");
            }
        });

        egui::Grid::new("offline_status_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Pending actions:");
                let pending_color = if summary.pending_actions > 0 {
                    egui::Color32::YELLOW
                } else {
                    egui::Color32::LIGHT_GRAY
                };
                ui.colored_label(pending_color, summary.pending_actions.to_string());
                ui.end_row();

                ui.label("Local tasks:");
                ui.label(summary.local_entities.to_string());
                ui.end_row();

                ui.label("Last sync:");
                match summary.last_sync {
                    Some(at) => ui.label(at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                    None => ui.colored_label(egui::Color32::DARK_GRAY, "never"),
                };
                ui.end_row();
            });
    });

    action
}
