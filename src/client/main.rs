/**
 * tasksync Desktop App - Main Entry Point
 *
 * Boots the offline engine from `TASKSYNC_CONFIG` or the environment and
 * shows its status panel with a manual sync button and a quick-add box for
 * new tasks.
 */
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;
use tasksync::client::auth::SessionAuth;
use tasksync::client::logging::init_tracing;
use tasksync::client::status::render_status_panel;
use tasksync::client::OfflineContext;
use tasksync::shared::{SyncConfig, TaskDraft};
use tokio::runtime::Runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let runtime = Runtime::new()?;
    let config = SyncConfig::from_env_or_file()?;
    let context = Arc::new(runtime.block_on(OfflineContext::bootstrap(
        config,
        Arc::new(SessionAuth::from_env()),
    ))?);
    {
        let _guard = runtime.enter();
        context.start();
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 320.0])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };
    let app = TaskSyncApp::new(context.clone(), runtime.handle().clone());
    let result = eframe::run_native("tasksync", options, Box::new(|_cc| Ok(Box::new(app))));

    runtime.block_on(context.dispose());
    result?;
    Ok(())
}

/// Main application state
struct TaskSyncApp {
    context: Arc<OfflineContext>,
    runtime: tokio::runtime::Handle,
    draft_title: String,
    message: Option<String>,
}

impl TaskSyncApp {
    fn new(context: Arc<OfflineContext>, runtime: tokio::runtime::Handle) -> Self {
        Self {
            context,
            runtime,
            draft_title: String::new(),
            message: None,
        }
    }

    fn trigger_sync(&mut self) {
        let context = self.context.clone();
        self.runtime.spawn(async move {
            if let Err(e) = context.sync().await {
                tracing::info!(error = %e, "manual sync from panel did not complete");
            }
        });
    }

    fn quick_add(&mut self) {
        let draft = TaskDraft::new(self.draft_title.trim());
        match draft.validate() {
            Ok(()) => {
                let id = self.context.log().record_create(draft);
                self.message = Some(format!("Saved offline as {}", id));
                self.draft_title.clear();
                self.context.summary();
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }
}

impl eframe::App for TaskSyncApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let reporter = self.context.reporter().clone();
        let summary = reporter
            .surface()
            .summary()
            .unwrap_or_else(|| reporter.force_update());

        egui::CentralPanel::default().show(ctx, |ui| {
            let action = render_status_panel(ui, &summary, reporter.is_visible());
            if action.toggle_visibility {
                if reporter.is_visible() {
                    reporter.hide();
                } else {
                    reporter.show();
                }
            }
            if action.sync_now {
                self.trigger_sync();
            }

            ui.separator();
            ui.horizontal(|ui| {
                let response = ui.text_edit_singleline(&mut self.draft_title);
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("➕ Add task").clicked() || submitted {
                    self.quick_add();
                }
            });

            if let Some(message) = &self.message {
                ui.label(message.as_str());
            }
        });

        // Background sync and probe results arrive without user input.
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}
