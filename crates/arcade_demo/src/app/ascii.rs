use std::fmt;
use std::ops::Range;

use arcade_core::{Color, Rect, Size, Surface};

const BLANK: char = ' ';
const FILL: char = '.';
const UNKNOWN_IMAGE: char = '?';

/// Text surface: each character cell covers a fixed patch of screen space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AsciiCanvas {
    columns: usize,
    rows: usize,
    cell: Size,
    cells: Vec<char>,
}

impl AsciiCanvas {
    /// Canvas of `columns` characters across `viewport`. Rows are twice as
    /// tall as columns are wide so frames keep a rough aspect ratio.
    pub(crate) fn for_viewport(viewport: Size, columns: usize) -> Self {
        let columns = columns.max(1);
        let cell_width = (viewport.width / columns as f32).max(f32::EPSILON);
        let cell = Size::new(cell_width, cell_width * 2.0);
        let rows = ((viewport.height / cell.height).ceil() as usize).max(1);
        Self {
            columns,
            rows,
            cell,
            cells: vec![BLANK; columns * rows],
        }
    }

    fn span(start: f32, end: f32, step: f32, limit: usize) -> Range<usize> {
        let first = (start / step).floor().clamp(0.0, limit as f32) as usize;
        let mut last = (end / step).ceil().clamp(0.0, limit as f32) as usize;
        if last <= first && first < limit && end > 0.0 {
            last = first + 1;
        }
        first..last
    }

    fn paint(&mut self, rect: Rect, glyph: char) {
        let columns = Self::span(rect.left, rect.right, self.cell.width, self.columns);
        let rows = Self::span(rect.top, rect.bottom, self.cell.height, self.rows);
        for row in rows {
            for column in columns.clone() {
                self.cells[row * self.columns + column] = glyph;
            }
        }
    }
}

/// First letter of the image's file name, uppercased.
fn image_glyph(image: &str) -> char {
    let file_name = image.rsplit(['/', '\\']).next().unwrap_or(image);
    file_name
        .chars()
        .find(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_uppercase())
        .unwrap_or(UNKNOWN_IMAGE)
}

impl Surface for AsciiCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let glyph = if color == Color::BLACK { BLANK } else { FILL };
        self.paint(rect, glyph);
    }

    fn draw_image(&mut self, image: &str, rect: Rect) {
        self.paint(rect, image_glyph(image));
    }
}

impl fmt::Display for AsciiCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(self.columns);
        writeln!(f, "+{border}+")?;
        for row in self.cells.chunks(self.columns) {
            let line: String = row.iter().collect();
            writeln!(f, "|{line}|")?;
        }
        write!(f, "+{border}+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::Vec2;

    fn canvas() -> AsciiCanvas {
        AsciiCanvas::for_viewport(Size::new(80.0, 40.0), 10)
    }

    impl AsciiCanvas {
        fn glyph_at(&self, column: usize, row: usize) -> Option<char> {
            if column >= self.columns || row >= self.rows {
                return None;
            }
            self.cells.get(row * self.columns + column).copied()
        }
    }

    #[test]
    fn grid_follows_viewport_aspect() {
        let canvas = canvas();
        assert_eq!(canvas.columns, 10);
        assert_eq!(canvas.rows, 3);
        assert_eq!(canvas.glyph_at(0, 0), Some(BLANK));
        assert_eq!(canvas.glyph_at(10, 0), None);
    }

    #[test]
    fn images_mark_covered_cells_with_their_initial() {
        let mut canvas = canvas();
        let rect = Rect::from_origin(Vec2::new(16.0, 16.0), Size::new(16.0, 16.0));
        canvas.draw_image("sprites/ship.png", rect);
        assert_eq!(canvas.glyph_at(2, 1), Some('S'));
        assert_eq!(canvas.glyph_at(3, 1), Some('S'));
        assert_eq!(canvas.glyph_at(4, 1), Some(BLANK));
        assert_eq!(canvas.glyph_at(2, 0), Some(BLANK));
    }

    #[test]
    fn thin_rects_still_cover_one_cell() {
        let mut canvas = canvas();
        let rect = Rect::from_origin(Vec2::new(9.0, 1.0), Size::new(2.0, 2.0));
        canvas.draw_image("bullet.png", rect);
        assert_eq!(canvas.glyph_at(1, 0), Some('B'));
    }

    #[test]
    fn off_screen_rects_are_clipped() {
        let mut canvas = canvas();
        let above = Rect::from_origin(Vec2::new(-40.0, -40.0), Size::new(20.0, 20.0));
        let corner = Rect::from_origin(Vec2::new(72.0, 32.0), Size::new(40.0, 40.0));
        canvas.draw_image("enemy.png", above);
        canvas.draw_image("enemy.png", corner);
        assert_eq!(canvas.glyph_at(0, 0), Some(BLANK));
        assert_eq!(canvas.glyph_at(9, 2), Some('E'));
    }

    #[test]
    fn background_fill_clears_and_display_frames_rows() {
        let mut canvas = canvas();
        canvas.fill_rect(Rect::of_size(Size::new(80.0, 40.0)), Color::WHITE);
        assert_eq!(canvas.glyph_at(5, 2), Some(FILL));
        canvas.fill_rect(Rect::of_size(Size::new(80.0, 40.0)), Color::BLACK);

        let text = canvas.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "+----------+");
        assert_eq!(lines[1], "|          |");
    }

    #[test]
    fn image_glyph_falls_back_for_unnamed_images() {
        assert_eq!(image_glyph("dir/invader.png"), 'I');
        assert_eq!(image_glyph("__.png"), 'P');
        assert_eq!(image_glyph(""), UNKNOWN_IMAGE);
    }
}
