use eframe::egui;
use enigo::MouseControllable;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::calibration::Anchor;
use crate::controller::{Event, RunState, StatusBoard};
use crate::geometry::Point;

/// Time to move the cursor onto the corner after pressing a capture button.
const CAPTURE_DELAY: Duration = Duration::from_secs(3);

pub fn run(events: Sender<Event>, board: StatusBoard) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([460.0, 420.0])
            .with_min_inner_size([420.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Grid Clicker",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(ControlPanel::new(events, board))
        }),
    )
}

// -------------- Control Panel --------------
struct ControlPanel {
    events: Sender<Event>,
    board: StatusBoard,
    enigo: enigo::Enigo,
    pending_capture: Option<(Anchor, Instant)>,
}

impl ControlPanel {
    fn new(events: Sender<Event>, board: StatusBoard) -> Self {
        Self { events, board, enigo: enigo::Enigo::new(), pending_capture: None }
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            warn!("Controller is gone; {event:?} dropped");
        }
    }

    fn poll_capture(&mut self) {
        if let Some((anchor, due)) = self.pending_capture {
            if Instant::now() >= due {
                self.pending_capture = None;
                let here = Point::from(self.enigo.mouse_location());
                self.send(Event::Capture(anchor, here));
            }
        }
    }
}

impl eframe::App for ControlPanel {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_capture();
        let status = self.board.lock().clone();
        let idle = status.state == RunState::Idle;

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("Grid Clicker");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.group(|ui| {
                ui.label("Calibration (screen px)");
                for anchor in Anchor::ALL {
                    ui.horizontal(|ui| {
                        let value = match status.calibration.get(anchor) {
                            Some(p) => format!("({:.0}, {:.0})", p.x, p.y),
                            None => "not set".to_owned(),
                        };
                        ui.monospace(format!("{:<4}{:>14}", anchor.label(), value));
                        match self.pending_capture {
                            Some((pending, due)) if pending == anchor => {
                                let left = due.saturating_duration_since(Instant::now());
                                ui.label(format!("capturing in {:.1}s…", left.as_secs_f32()));
                            }
                            _ => {
                                if ui.button("Capture").on_hover_text(anchor.describe()).clicked() {
                                    self.pending_capture = Some((anchor, Instant::now() + CAPTURE_DELAY));
                                }
                            }
                        }
                    });
                }
            });

            ui.separator();

            ui.group(|ui| {
                let cfg = status.config;
                ui.label("Grid");
                ui.monospace(format!("{} columns × {} rows", cfg.columns, cfg.rows));
                ui.monospace(format!("speed {} · order: {}", cfg.speed.code(), cfg.scan_order.label()));
                ui.monospace(format!("hold {} · jitter {:?}", cfg.modifier.name(), cfg.jitter));
                if ui.button("Reload config").clicked() { self.send(Event::Reload); }
            });

            ui.separator();

            ui.group(|ui| {
                ui.horizontal(|ui| {
                    if ui.add_enabled(idle, egui::Button::new("Start")).clicked() { self.send(Event::Start); }
                    if ui.button("Stop").clicked() { self.send(Event::Stop); }
                    ui.label(format!("Status: {}", status.state.label()));
                });
                if status.cells > 0 {
                    let done = status.clicks as f32 / status.cells as f32;
                    ui.add(egui::ProgressBar::new(done).text(format!("{}/{}", status.clicks, status.cells)));
                }
                if let Some(report) = &status.last_report {
                    ui.monospace(report.as_str());
                }
            });

            #[cfg(feature = "hooks")]
            {
                ui.separator();
                ui.small(crate::hotkeys::HELP);
            }
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
