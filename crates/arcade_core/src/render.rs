use crate::geometry::{Rect, Size, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
}

/// Drawing target supplied by the host. Rects are in screen space.
pub trait Surface {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn draw_image(&mut self, image: &str, rect: Rect);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill { rect: Rect, color: Color },
    Image { image: String, rect: Rect },
}

/// Surface that records draw calls in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn image_rects(&self, image: &str) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Image { image: name, rect } if name == image => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DrawList {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Fill { rect, color });
    }

    fn draw_image(&mut self, image: &str, rect: Rect) {
        self.commands.push(DrawCommand::Image {
            image: image.to_string(),
            rect,
        });
    }
}

/// Viewport onto the level. `offset` is the world position of the
/// viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    pub viewport: Size,
    /// When set, `center_on` keeps the viewport inside these bounds.
    pub limits: Option<Rect>,
}

impl Camera {
    pub fn new(offset: Vec2, viewport: Size) -> Self {
        Self {
            offset,
            viewport,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: Rect) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn visible_region(&self) -> Rect {
        Rect::from_origin(self.offset, self.viewport)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset
    }

    pub fn world_to_screen_rect(&self, world: Rect) -> Rect {
        Rect {
            left: world.left - self.offset.x,
            top: world.top - self.offset.y,
            right: world.right - self.offset.x,
            bottom: world.bottom - self.offset.y,
        }
    }

    pub fn center_on(&mut self, point: Vec2) {
        let mut offset = Vec2 {
            x: point.x - self.viewport.width * 0.5,
            y: point.y - self.viewport.height * 0.5,
        };
        if let Some(limits) = self.limits {
            offset.x = clamp_axis(offset.x, limits.left, limits.right - self.viewport.width);
            offset.y = clamp_axis(offset.y, limits.top, limits.bottom - self.viewport.height);
        }
        self.offset = offset;
    }
}

// A viewport larger than the limits pins to the low edge.
fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        return min;
    }
    value.clamp(min, max)
}
