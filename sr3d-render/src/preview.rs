/// ASCII preview of a rendered framebuffer for terminals
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use sr3d_core::Framebuffer;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

/// Downsamples a framebuffer into colored terminal characters
pub struct AsciiPreview {
    columns: usize,
    rows: usize,
}

impl AsciiPreview {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Size the preview to the current terminal, keeping the image's aspect ratio.
    /// Falls back to 80x24 when stdout is not a terminal.
    pub fn for_terminal(image: &Framebuffer) -> Self {
        let (columns, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        Self::fit(image, columns as usize, rows.saturating_sub(1) as usize)
    }

    /// Largest preview within `columns` x `rows` cells with the image's aspect ratio
    pub fn fit(image: &Framebuffer, columns: usize, rows: usize) -> Self {
        let aspect = image.width() as f32 / image.height().max(1) as f32;
        let columns = columns.max(1);
        let rows_for_width = (columns as f32 / aspect / CELL_ASPECT).round() as usize;
        if rows_for_width <= rows {
            Self::new(columns, rows_for_width)
        } else {
            let columns = (rows as f32 * aspect * CELL_ASPECT).round() as usize;
            Self::new(columns, rows)
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Character and color for the cell at (`column`, `row`), sampling the
    /// pixel under the cell's center
    fn cell(&self, image: &Framebuffer, column: usize, row: usize) -> (char, Color) {
        let x = ((column as f32 + 0.5) * image.width() as f32 / self.columns as f32) as usize;
        let y = ((row as f32 + 0.5) * image.height() as f32 / self.rows as f32) as usize;
        let pixel = image.pixel(x, y).unwrap_or(sr3d_core::Color::BLACK);

        let char_index = (pixel.luminance() * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let color = Color::Rgb {
            r: pixel.r,
            g: pixel.g,
            b: pixel.b,
        };
        (LUMINOSITY_RAMP[char_index], color)
    }

    /// Write the preview, top row first. `image` must already be flipped so that
    /// row 0 is the top.
    pub fn draw<W: Write>(&self, image: &Framebuffer, writer: &mut W) -> std::io::Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        for row in 0..self.rows {
            for column in 0..self.columns {
                let (c, color) = self.cell(image, column, row);
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(ResetColor)?;
            writer.queue(Print('\n'))?;
        }
        writer.flush()
    }
}
