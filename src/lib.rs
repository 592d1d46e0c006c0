#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    collections::{HashMap, VecDeque},
    rc::Rc,
    time::Instant,
};

use alarm::AlarmController;
use alarm_panel::AlarmPanel;
use assets::{AssetResolver, ResolvedAsset};
use audio::RodioOutput;
use clock::{ClockDriver, TICK};
use config::Config;
use eframe::egui::{
    self, Button, CentralPanel, ColorImage, Context, Frame, Id, Modal, PointerButton, RichText,
    Sense, TextureHandle, TextureOptions, TopBottomPanel, UiKind, ViewportCommand, WindowLevel,
};
use log::{error, info, warn};
use notice::{Notice, Severity};
use scale::{BASE_MIN_SIZE, BASE_SIZE, SCALE_PRESETS};
use selection::{AssetCategory, AssetSelection, VARIANTS};
use sources::EmbeddedBundle;
use widgets::ClockFace;

pub mod alarm;
/// the alarm controls under the face
pub mod alarm_panel;
pub mod assets;
pub mod audio;
pub mod clock;
pub mod config;
pub mod notice;
pub mod scale;
pub mod selection;
pub mod sources;
pub mod widgets;

pub struct Clock {
    config: Config,
    resolver: Rc<AssetResolver>,
    alarm: AlarmController<RodioOutput>,
    driver: ClockDriver,
    selection: AssetSelection,
    textures: HashMap<AssetCategory, TextureHandle>,
    scale: f32,
    topmost: bool,
    show_alarm_panel: bool,
    panel: AlarmPanel,
    notices: VecDeque<Notice>,
}

impl Clock {
    /// Builds the clock inside an already created window. Nothing here is
    /// fatal: whatever can't be loaded is reported and left out.
    #[must_use]
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        let ctx = &cc.egui_ctx;
        let resolver = Rc::new(AssetResolver::standard(
            EmbeddedBundle::builtin(),
            config.origin(),
            sources::executable_base_dir()
                .inspect_err(|e| warn!("no executable directory to load files from: {e}"))
                .ok(),
        ));
        info!("resolving assets through {resolver:?}");

        let mut notices = VecDeque::new();
        let (audio, audio_ready) = match RodioOutput::open_default() {
            Ok(audio) => (audio, true),
            Err(e) => {
                error!("{e}");
                notices.push_back(Notice::error(
                    "No audio output",
                    format!("{e}\nthe alarm will not make a sound"),
                ));
                (RodioOutput::disconnected(), false)
            }
        };
        let selection = config.selection.sanitized();
        let mut alarm = AlarmController::new(audio, Rc::clone(&resolver), selection.alarm_sound);
        if audio_ready {
            alarm.preload();
        }

        let panel = AlarmPanel::new(config.alarm.clone().unwrap_or_default());
        if config.alarm.is_some() {
            panel.apply(&mut alarm);
        }

        let mut clock = Self {
            resolver,
            alarm,
            driver: ClockDriver::new(TICK, chrono::Local::now().naive_local()),
            selection,
            textures: HashMap::new(),
            scale: config.scale,
            topmost: config.topmost,
            show_alarm_panel: config.show_alarm_panel,
            panel,
            notices,
            config,
        };
        for category in AssetCategory::IMAGES {
            clock.reload_image(ctx, category);
        }
        ctx.set_visuals(clock.config.theme.into());
        clock.apply_scale(ctx, clock.scale);
        clock.apply_topmost(ctx);
        clock
    }

    /// Resolves the selected variant of `category` and turns it into a
    /// texture. On failure the previous texture stays, and with none the face
    /// draws that part itself.
    fn reload_image(&mut self, ctx: &Context, category: AssetCategory) {
        let request = category.request(self.selection.get(category));
        let resolution = self.resolver.resolve(&request, category.kind());
        if let Some(image) = resolution.asset.and_then(ResolvedAsset::into_image) {
            let image = ColorImage::from_rgba_unmultiplied(image.size(), image.pixels());
            let texture = ctx.load_texture(request.to_string(), image, TextureOptions::LINEAR);
            self.textures.insert(category, texture);
        } else {
            self.push_notice(Notice::warning(
                format!("Couldn't load {category}"),
                format!("{request} wasn't found anywhere:\n{}", resolution.trace),
            ));
        }
    }

    fn select(&mut self, ctx: &Context, category: AssetCategory, index: usize) {
        if !self.selection.set(category, index) {
            return;
        }
        info!("{category} set to {}", category.variant_label(index));
        match category {
            AssetCategory::AlarmSound => {
                self.alarm.reload_active_sound(index);
            }
            AssetCategory::Face | AssetCategory::HourHand | AssetCategory::MinuteHand => {
                self.reload_image(ctx, category);
            }
        }
    }

    /// Zooms the whole ui. Window sizes are in points, which already include
    /// the zoom, so the base sizes are sent as they are.
    fn apply_scale(&mut self, ctx: &Context, scale: f32) {
        self.scale = scale;
        ctx.set_zoom_factor(scale);
        ctx.send_viewport_cmd(ViewportCommand::MinInnerSize(BASE_MIN_SIZE.into()));
        ctx.send_viewport_cmd(ViewportCommand::InnerSize(BASE_SIZE.into()));
    }

    fn apply_topmost(&self, ctx: &Context) {
        ctx.send_viewport_cmd(ViewportCommand::WindowLevel(if self.topmost {
            WindowLevel::AlwaysOnTop
        } else {
            WindowLevel::Normal
        }));
    }

    /// queues a notice unless the same one is already waiting
    fn push_notice(&mut self, notice: Notice) {
        if !self.notices.contains(&notice) {
            self.notices.push_back(notice);
        }
    }

    fn render_notice(&mut self, ctx: &Context) {
        let Some(notice) = self.notices.front() else {
            return;
        };
        let mut dismissed = false;
        let response = Modal::new(Id::new("notice")).show(ctx, |ui| {
            let color = match notice.severity {
                Severity::Warning => ui.visuals().warn_fg_color,
                Severity::Error => ui.visuals().error_fg_color,
            };
            ui.heading(RichText::new(notice.title.as_str()).color(color));
            ui.label(notice.body.as_str());
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
        if dismissed || response.should_close() {
            self.notices.pop_front();
        }
    }

    fn render_context_menu(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        let mut show_panel = self.show_alarm_panel;
        if ui.checkbox(&mut show_panel, "Alarm panel").changed() {
            self.show_alarm_panel = show_panel;
            if show_panel {
                self.panel.apply(&mut self.alarm);
            }
        }
        if ui.checkbox(&mut self.topmost, "Always on top").changed() {
            self.apply_topmost(&ctx);
        }
        ui.menu_button("Scale", |ui| {
            for preset in SCALE_PRESETS {
                if ui
                    .radio(scale::is_current(preset, self.scale), format!("{preset}x"))
                    .clicked()
                {
                    self.apply_scale(&ctx, preset);
                    ui.close_kind(UiKind::Menu);
                }
            }
        });
        ui.separator();
        for category in AssetCategory::ALL {
            ui.menu_button(category.label(), |ui| {
                for index in 0..VARIANTS {
                    let current = self.selection.get(category) == index;
                    if ui.radio(current, category.variant_label(index)).clicked() {
                        self.select(&ctx, category, index);
                        ui.close_kind(UiKind::Menu);
                    }
                }
            });
        }
        ui.separator();
        let theme = !self.config.theme;
        if ui.button(format!("{theme:?} theme")).clicked() {
            self.config.theme = theme;
            ctx.set_visuals(theme.into());
        }
        if ui.add(Button::new("Quit")).clicked() {
            ctx.send_viewport_cmd(ViewportCommand::Close);
        }
    }
}

impl eframe::App for Clock {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.driver.poll(Instant::now()) {
            self.driver
                .tick(chrono::Local::now().naive_local(), &mut self.alarm);
        }
        // no input means no frames, so wake up for the next tick
        ctx.request_repaint_after(self.driver.until_next(Instant::now()));

        for notice in self.alarm.take_notices() {
            self.push_notice(notice);
        }
        self.render_notice(ctx);

        if self.show_alarm_panel {
            TopBottomPanel::bottom("alarm_panel").show(ctx, |ui| {
                self.panel.show(ui, &mut self.alarm);
            });
        }

        CentralPanel::default().frame(Frame::NONE).show(ctx, |ui| {
            let on_border = widgets::resize_handles(ui, ctx.screen_rect());
            let background = ui.interact(
                ui.max_rect(),
                Id::new("clock_background"),
                Sense::click_and_drag(),
            );
            let face = ui
                .vertical_centered(|ui| {
                    ui.add(
                        ClockFace::new(self.driver.reading())
                            .face(self.textures.get(&AssetCategory::Face))
                            .hands(
                                self.textures.get(&AssetCategory::HourHand),
                                self.textures.get(&AssetCategory::MinuteHand),
                            ),
                    )
                })
                .inner;
            let response = background | face;
            if response.drag_started_by(PointerButton::Primary) && !on_border {
                ctx.send_viewport_cmd(ViewportCommand::StartDrag);
            }
            response.context_menu(|ui| self.render_context_menu(ui));
        });
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // only the face is visible, the rest of the window is see through
        [0.0; 4]
    }
}
