//! Native egui/eframe GUI for mca_daq.
//!
//! A lightweight control panel for the spectrum workflow:
//! - Read a spectrum from the configured serial port
//! - Load a previously saved CSV / save the current pair
//! - Plot raw and smoothed series over the 4096 channels
//!
//! Acquisition runs on the UI thread and blocks while the exchange is in
//! flight; the whole pipeline is synchronous by design and a single
//! acquisition is the most that can be in progress at a time.

use std::path::Path;

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::error;

use mca_daq::config::Settings;
use mca_daq::session::SpectrumSession;

struct SpectrumApp {
    session: SpectrumSession,
    status_line: String,
    load_path: String,
}

impl SpectrumApp {
    fn new(settings: Settings) -> Self {
        let status_line = format!(
            "Ready. Port {} at {} baud.",
            settings.port, settings.baud_rate
        );
        Self {
            session: SpectrumSession::new(settings),
            status_line,
            load_path: String::new(),
        }
    }

    fn read_spectrum(&mut self) {
        match self.session.acquire() {
            Ok(_) => {
                self.status_line = "Spectrum data read from serial port.".to_string();
            }
            Err(e) => {
                error!("Acquisition failed: {}", e);
                self.status_line = format!("Error: {}", e);
            }
        }
    }

    fn save_csv(&mut self) {
        match self.session.save_timestamped() {
            Ok(path) => {
                self.status_line = format!("Spectrum data saved to {}.", path.display());
            }
            Err(e) => self.status_line = format!("Error: {}", e),
        }
    }

    fn load_csv(&mut self) {
        if self.load_path.is_empty() {
            self.status_line = "No file selected.".to_string();
            return;
        }
        let path = self.load_path.clone();
        match self.session.load_csv(Path::new(&path)) {
            Ok(_) => {
                self.status_line = format!("Spectrum data loaded from {}.", path);
            }
            Err(e) => self.status_line = format!("Error: {}", e),
        }
    }
}

impl eframe::App for SpectrumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.heading("Spectrum Reader");
            ui.horizontal(|ui| {
                if ui.button("Read Spectrum").clicked() {
                    self.read_spectrum();
                }
                if ui.button("Save CSV").clicked() {
                    self.save_csv();
                }
                ui.separator();
                ui.label("File:");
                ui.text_edit_singleline(&mut self.load_path);
                if ui.button("Load Spectrum").clicked() {
                    self.load_csv();
                }
            });
            ui.label(&self.status_line);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            Plot::new("spectrum_plot")
                .legend(Legend::default())
                .x_axis_label("Channel")
                .y_axis_label("Counts")
                .show(ui, |plot_ui| {
                    if let Some(pair) = self.session.current() {
                        plot_ui.line(Line::new(series_points(&pair.raw)).name("Raw Spectrum"));
                        plot_ui.line(
                            Line::new(series_points(&pair.smoothed)).name("Smoothed Spectrum"),
                        );
                    }
                });
        });
    }
}

fn series_points(values: &[u32]) -> PlotPoints {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| [i as f64, f64::from(v)])
        .collect()
}

fn main() -> eframe::Result {
    env_logger::init();

    let settings = match Settings::load(None) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            Settings::default()
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Spectrum Reader",
        native_options,
        Box::new(|_cc| Ok(Box::new(SpectrumApp::new(settings)))),
    )
}
