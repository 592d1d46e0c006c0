use eframe::egui::{
    self, load::SizedTexture, Align2, CursorIcon, FontId, Pos2, Rect, Response,
    ResizeDirection, Sense, Stroke, TextureHandle, Ui, Vec2, ViewportCommand, Widget,
};

use crate::clock::ClockReading;

/// width of the band along the window edge that starts a resize
pub const RESIZE_BAND: f32 = 6.0;

/// An analog face. Every part is drawn from its texture when there is one and
/// painted as simple shapes otherwise.
///
/// The hand textures cover the whole face with the hand pointing at 12, so
/// turning them about the centre is enough.
pub struct ClockFace<'a> {
    reading: &'a ClockReading,
    face: Option<&'a TextureHandle>,
    hour_hand: Option<&'a TextureHandle>,
    minute_hand: Option<&'a TextureHandle>,
}

impl<'a> ClockFace<'a> {
    #[must_use]
    pub const fn new(reading: &'a ClockReading) -> Self {
        Self {
            reading,
            face: None,
            hour_hand: None,
            minute_hand: None,
        }
    }

    #[must_use]
    pub const fn face(mut self, texture: Option<&'a TextureHandle>) -> Self {
        self.face = texture;
        self
    }

    #[must_use]
    pub const fn hands(
        mut self,
        hour: Option<&'a TextureHandle>,
        minute: Option<&'a TextureHandle>,
    ) -> Self {
        self.hour_hand = hour;
        self.minute_hand = minute;
        self
    }
}

impl Widget for ClockFace<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let Self {
            reading,
            face,
            hour_hand,
            minute_hand,
        } = self;

        // the largest square that fits
        let available = ui.available_size();
        let diameter = available.x.min(available.y);
        // the background of the face is where the window gets dragged from
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(diameter), Sense::click_and_drag());
        if !ui.is_rect_visible(rect) {
            return response;
        }
        let visuals = ui.style().noninteractive();
        let radius = diameter / 2.;
        let center = rect.center();

        match face {
            Some(texture) => paint_texture(ui, texture, rect, 0.),
            None => {
                ui.painter()
                    .circle_filled(center, radius, ui.visuals().extreme_bg_color);
                ui.painter().circle_stroke(center, radius, visuals.fg_stroke);
                for hour in 0..12u8 {
                    let direction = hand_direction(f32::from(hour) * 30.);
                    let length = if hour % 3 == 0 { 0.15 } else { 0.07 };
                    ui.painter().line_segment(
                        [
                            center + direction * radius * (1. - length),
                            center + direction * radius * 0.95,
                        ],
                        visuals.fg_stroke,
                    );
                }
            }
        }

        ui.painter().text(
            center + Vec2::new(0., radius * 0.4),
            Align2::CENTER_CENTER,
            &reading.time_text,
            FontId::monospace(radius * 0.16),
            visuals.text_color(),
        );

        let hands = [
            (hour_hand, reading.hands.hour, 0.5, 3.),
            (minute_hand, reading.hands.minute, 0.8, 2.),
        ];
        for (texture, degrees, length, width) in hands {
            match texture {
                Some(texture) => paint_texture(ui, texture, rect, degrees),
                None => {
                    let tip = center + hand_direction(degrees) * radius * length;
                    let stroke = Stroke::new(width * radius / 100., visuals.fg_stroke.color);
                    ui.painter().line_segment([center, tip], stroke);
                }
            }
        }
        ui.painter()
            .circle_filled(center, radius * 0.03, visuals.fg_stroke.color);

        response
    }
}

/// unit vector for an angle in degrees clockwise from 12
fn hand_direction(degrees: f32) -> Vec2 {
    // egui angles start at 3 o'clock and y grows downwards
    Vec2::angled((degrees - 90.).to_radians())
}

fn paint_texture(ui: &Ui, texture: &TextureHandle, rect: Rect, degrees: f32) {
    egui::Image::new(SizedTexture::from_handle(texture))
        .rotate(degrees.to_radians(), Vec2::splat(0.5))
        .paint_at(ui, rect);
}

/// Which way a press at `pos` resizes a window filling `rect`, if it is in
/// the band along the edges.
#[must_use]
pub fn resize_direction(rect: Rect, pos: Pos2, band: f32) -> Option<ResizeDirection> {
    if !rect.contains(pos) {
        return None;
    }
    let west = pos.x - rect.left() < band;
    let east = rect.right() - pos.x < band;
    let north = pos.y - rect.top() < band;
    let south = rect.bottom() - pos.y < band;
    Some(match (north, south, west, east) {
        (true, _, true, _) => ResizeDirection::NorthWest,
        (true, _, _, true) => ResizeDirection::NorthEast,
        (_, true, true, _) => ResizeDirection::SouthWest,
        (_, true, _, true) => ResizeDirection::SouthEast,
        (true, ..) => ResizeDirection::North,
        (_, true, ..) => ResizeDirection::South,
        (.., true, _) => ResizeDirection::West,
        (.., true) => ResizeDirection::East,
        _ => return None,
    })
}

const fn resize_cursor(direction: ResizeDirection) -> CursorIcon {
    match direction {
        ResizeDirection::North => CursorIcon::ResizeNorth,
        ResizeDirection::South => CursorIcon::ResizeSouth,
        ResizeDirection::East => CursorIcon::ResizeEast,
        ResizeDirection::West => CursorIcon::ResizeWest,
        ResizeDirection::NorthEast => CursorIcon::ResizeNorthEast,
        ResizeDirection::SouthEast => CursorIcon::ResizeSouthEast,
        ResizeDirection::NorthWest => CursorIcon::ResizeNorthWest,
        ResizeDirection::SouthWest => CursorIcon::ResizeSouthWest,
    }
}

/// Starts an OS resize when the window border is pressed. Returns true if the
/// pointer is on the border, so the caller doesn't start a move as well.
pub fn resize_handles(ui: &Ui, rect: Rect) -> bool {
    let Some(direction) = ui
        .input(|input| input.pointer.hover_pos())
        .and_then(|pos| resize_direction(rect, pos, RESIZE_BAND))
    else {
        return false;
    };
    ui.ctx().set_cursor_icon(resize_cursor(direction));
    if ui.input(|input| input.pointer.primary_pressed()) {
        ui.ctx()
            .send_viewport_cmd(ViewportCommand::BeginResize(direction));
    }
    true
}
