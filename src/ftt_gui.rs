// GUI implementation for the train tracker using egui/eframe
use crate::ftt_config::FTTConfig;
use crate::ftt_icons::{ICON_ANCHOR, ICON_SIZE, POPUP_ANCHOR};
use crate::ftt_map::{MapCamera, TILE_ATTRIBUTION, TILE_COPYRIGHT_URL};
use crate::ftt_poller::FeedPoller;
use crate::ftt_regions::Region;
use crate::ftt_state::{ViewSnapshot, ViewStore};
use crate::ftt_views::{FTTViews, TrainMarker};
use chrono::Utc;
use eframe::egui;
use egui::{Align2, Color32, Pos2, Rect, RichText, Sense, Ui, vec2};
use std::time::Duration;

const BYLINE: &str = "Live positions from Digitraffic";

// ============================================================================
// Application State
// ============================================================================

pub struct FTTApp {
    store: ViewStore,
    // Dropping the app stops polling.
    poller: FeedPoller,

    // Map camera, seeded from the store once and then driven by the user.
    camera: MapCamera,
    // Index into the marker list of the open popup.
    open_popup: Option<usize>,
    filter_map_by_region: bool,
}

impl FTTApp {
    pub fn new(cc: &eframe::CreationContext<'_>, store: ViewStore, poller: FeedPoller, filter_map_by_region: bool) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        let camera = MapCamera::from_viewport(store.snapshot().viewport);

        Self {
            store,
            poller,
            camera,
            open_popup: None,
            filter_map_by_region,
        }
    }
}

impl eframe::App for FTTApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Clock and feed ticks
        ctx.request_repaint_after(Duration::from_secs(1));

        // One snapshot feeds every panel of this frame.
        let snapshot = self.store.snapshot();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.show_top_bar(ui, &snapshot);
        });

        egui::SidePanel::left("sidebar").min_width(260.0).show(ctx, |ui| {
            self.show_sidebar(ui, &snapshot);
        });

        egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
            self.show_map(ui, &snapshot);
        });
    }
}

// ============================================================================
// View Implementations
// ============================================================================

impl FTTApp {
    fn show_top_bar(&self, ui: &mut Ui, snapshot: &ViewSnapshot) {
        ui.horizontal(|ui| {
            ui.heading("🚆 Train Tracker");
            ui.label(RichText::new(BYLINE).weak());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(FTTViews::format_clock(Utc::now()));
                if self.poller.is_running() {
                    ui.colored_label(Color32::from_rgb(0, 200, 0), "● Live");
                } else {
                    ui.colored_label(Color32::RED, "● Polling stopped");
                }
                match snapshot.last_tick {
                    Some(tick) => ui.label(format!("Updated {} |", FTTViews::format_clock(tick))),
                    None => ui.label("Loading… |"),
                };
            });
        });
    }

    fn show_sidebar(&mut self, ui: &mut Ui, snapshot: &ViewSnapshot) {
        ui.heading("Active Trains");
        ui.separator();

        let mut region = snapshot.region;
        egui::ComboBox::from_label("Select Region")
            .selected_text(region.label())
            .show_ui(ui, |ui| {
                for option in Region::ALL {
                    ui.selectable_value(&mut region, option, option.label());
                }
            });
        if region != snapshot.region {
            self.store.set_region(region);
            self.open_popup = None;
            ui.ctx().request_repaint();
        }

        if ui.checkbox(&mut self.filter_map_by_region, "Filter map by region").changed() {
            self.open_popup = None;
        }
        ui.separator();

        let trains = FTTViews::sidebar_trains(&snapshot.trains, snapshot.region);
        ui.label(format!("{} of {} trains", trains.len(), snapshot.trains.len()));
        ui.add_space(5.0);

        let row_height = ui.text_style_height(&egui::TextStyle::Body);
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show_rows(ui, row_height, trains.len(), |ui, rows| {
                for train in &trains[rows] {
                    ui.label(FTTViews::sidebar_line(train));
                }
            });
    }

    fn show_map(&mut self, ui: &mut Ui, snapshot: &ViewSnapshot) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let canvas = response.rect;
        painter.rect_filled(canvas, 0.0, Color32::from_rgb(170, 211, 223));

        // Pan and zoom; the store only hears about finished gestures.
        if response.dragged() {
            self.camera.pan(response.drag_delta());
        }
        if response.drag_stopped() {
            self.store.set_viewport(self.camera.viewport());
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 && self.camera.zoom_by(scroll.signum() as i32) {
                self.store.set_viewport(self.camera.viewport());
            }
        }

        for placed in self.camera.visible_tiles(canvas) {
            egui::Image::new(placed.tile.url()).paint_at(ui, placed.rect);
        }

        let filter = if self.filter_map_by_region { snapshot.region } else { Region::All };
        let markers = FTTViews::map_markers(&snapshot.trains, filter);
        let rects: Vec<Rect> = markers
            .iter()
            .map(|m| marker_rect(self.camera.to_screen(m.lat, m.lon, canvas)))
            .collect();

        for (marker, rect) in markers.iter().zip(&rects) {
            if canvas.intersects(*rect) {
                egui::Image::from_bytes(marker.icon.uri.clone(), marker.icon.svg.clone()).paint_at(ui, *rect);
            }
        }

        if response.clicked() {
            self.open_popup = response.interact_pointer_pos().and_then(|pos| hit_marker(&rects, pos));
        }
        if let Some(index) = self.open_popup {
            match (markers.get(index), rects.get(index)) {
                (Some(marker), Some(rect)) => {
                    let tip = rect.min + vec2(ICON_ANCHOR[0], ICON_ANCHOR[1]);
                    if !self.show_popup(ui.ctx(), marker, tip + vec2(POPUP_ANCHOR[0], POPUP_ANCHOR[1])) {
                        self.open_popup = None;
                    }
                }
                _ => self.open_popup = None,
            }
        }

        if snapshot.last_tick.is_none() {
            painter.text(
                canvas.center(),
                Align2::CENTER_CENTER,
                "Waiting for the first train update…",
                egui::FontId::proportional(18.0),
                Color32::BLACK,
            );
        }

        self.show_zoom_controls(ui, canvas);
        show_attribution(ui, canvas);
    }

    /// Returns false once the user closes the popup.
    fn show_popup(&self, ctx: &egui::Context, marker: &TrainMarker<'_>, pos: Pos2) -> bool {
        let mut keep_open = true;
        egui::Area::new(egui::Id::new("train_popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(pos)
            .pivot(Align2::CENTER_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.strong(FTTViews::train_label(marker.train));
                        if ui.small_button("✕").clicked() {
                            keep_open = false;
                        }
                    });
                    for line in FTTViews::popup_lines(marker.train) {
                        ui.label(line);
                    }
                });
            });
        keep_open
    }

    fn show_zoom_controls(&mut self, ui: &mut Ui, canvas: Rect) {
        let plus = Rect::from_min_size(canvas.min + vec2(10.0, 10.0), vec2(28.0, 28.0));
        let minus = plus.translate(vec2(0.0, 32.0));

        let mut levels = 0;
        if ui.put(plus, egui::Button::new(RichText::new("+").size(18.0))).clicked() {
            levels += 1;
        }
        if ui.put(minus, egui::Button::new(RichText::new("−").size(18.0))).clicked() {
            levels -= 1;
        }
        if levels != 0 && self.camera.zoom_by(levels) {
            self.store.set_viewport(self.camera.viewport());
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Screen rectangle of a marker whose tip sits on `tip`.
fn marker_rect(tip: Pos2) -> Rect {
    Rect::from_min_size(
        tip - vec2(ICON_ANCHOR[0], ICON_ANCHOR[1]),
        vec2(ICON_SIZE[0], ICON_SIZE[1]),
    )
}

/// Topmost marker under `pos`; later markers are painted on top.
fn hit_marker(rects: &[Rect], pos: Pos2) -> Option<usize> {
    rects.iter().rposition(|rect| rect.contains(pos))
}

fn show_attribution(ui: &mut Ui, canvas: Rect) {
    let rect = Rect::from_min_max(canvas.right_bottom() - vec2(190.0, 20.0), canvas.right_bottom());
    ui.painter().rect_filled(rect, 0.0, Color32::from_white_alpha(200));
    ui.put(rect, egui::Hyperlink::from_label_and_url(RichText::new(TILE_ATTRIBUTION).small(), TILE_COPYRIGHT_URL));
}

// ============================================================================
// Public entry point
// ============================================================================

pub fn run_gui(store: ViewStore, poller: FeedPoller, config: &FTTConfig) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    let filter_map_by_region = config.filter_map_by_region;
    eframe::run_native(
        "Train Tracker",
        options,
        Box::new(move |cc| Ok(Box::new(FTTApp::new(cc, store, poller, filter_map_by_region)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn marker_tip_is_bottom_center() {
        let rect = marker_rect(pos2(100.0, 200.0));
        assert_eq!(rect.size(), vec2(32.0, 40.0));
        assert_eq!(rect.center_bottom(), pos2(100.0, 200.0));
    }

    #[test]
    fn hit_prefers_topmost_marker() {
        let rects = vec![marker_rect(pos2(100.0, 100.0)), marker_rect(pos2(110.0, 100.0))];
        assert_eq!(hit_marker(&rects, pos2(105.0, 90.0)), Some(1));
        assert_eq!(hit_marker(&rects, pos2(88.0, 90.0)), Some(0));
        assert_eq!(hit_marker(&rects, pos2(300.0, 300.0)), None);
    }
}
