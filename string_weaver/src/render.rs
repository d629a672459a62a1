use std::fmt::Write as _;

use image::{Rgb, RgbImage};
use palette::Srgb;

use crate::{algorithm::Edge, config::Shape, geometry::Point, DistanceTable, Float, Raster};

/// Borrowed view over a path, used to paint it.
///
/// Strokes are painted with [`DistanceTable::walk`], the same walk the raster
/// is darkened with, so a preview shows exactly the cells the run covered.
#[derive(Clone, Copy)]
pub struct Drawing<'a, S> {
    table: &'a DistanceTable<S>,
    edges: &'a [Edge],
    points: &'a [Point<usize>],
    opacity: u8,
}

impl<'a, S: Float> Drawing<'a, S> {
    pub fn new(
        table: &'a DistanceTable<S>,
        edges: &'a [Edge],
        points: &'a [Point<usize>],
        opacity: u8,
    ) -> Self {
        Self {
            table,
            edges,
            points,
            opacity,
        }
    }

    pub fn edges(&self) -> &'a [Edge] {
        self.edges
    }

    pub fn points(&self) -> &'a [Point<usize>] {
        self.points
    }

    /// Paints every edge onto a `background` canvas of the raster size.
    ///
    /// Each pass lowers the cells it crosses by the thread's share of
    /// `255 - string`, so overlapping threads build up towards the string colour.
    pub fn build_rgb(&self, background: Srgb<u8>, string: Srgb<u8>) -> RgbImage {
        let grid = self.table.grid();
        let mut image = RgbImage::from_pixel(
            grid.width as u32,
            grid.height as u32,
            Rgb([background.red, background.green, background.blue]),
        );
        let shade = |channel: u8| -> u8 {
            let share = f32::from(self.opacity) / f32::from(Raster::MAX);
            (share * f32::from(Raster::MAX - channel)).round() as u8
        };
        let shade = [shade(string.red), shade(string.green), shade(string.blue)];
        for edge in self.edges {
            for cell in self.table.walk(edge.from, edge.to) {
                if !grid.contains(cell) {
                    continue;
                }
                let pixel = image.get_pixel_mut(cell.x as u32, cell.y as u32);
                for (value, shade) in pixel.0.iter_mut().zip(shade) {
                    *value = value.saturating_sub(shade);
                }
            }
        }
        image
    }

    pub fn build_svg(&self, line_thickness: f32, background: Srgb<u8>, string: Srgb<u8>) -> svg::Document {
        let grid = self.table.grid();
        let mut doc = svg::Document::new()
            .set("viewBox", (0, 0, grid.width, grid.height))
            .add(
                svg::node::element::Rectangle::new()
                    .set("width", grid.width)
                    .set("height", grid.height)
                    .set("fill", rgb(background)),
            );
        for nail in self.table.nails() {
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", nail.x)
                    .set("cy", nail.y)
                    .set("r", format!("{:.4}", line_thickness))
                    .set("fill", "black"),
            );
        }

        let opacity = f32::from(self.opacity) / f32::from(Raster::MAX);
        for edge in self.edges {
            let segment = self.table.segment(edge.from, edge.to);
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", segment.start.x)
                    .set("y1", segment.start.y)
                    .set("x2", segment.end.x)
                    .set("y2", segment.end.y)
                    .set("stroke", rgb(string))
                    .set("stroke-width", format!("{:.4}", line_thickness))
                    .set("stroke-opacity", format!("{:.4}", opacity)),
            );
        }
        doc
    }

    /// Threading guide: the nail to hook at every step, `group` nails per
    /// column and two columns per row.
    pub fn build_instructions(&self, group: usize) -> String {
        let group = group.max(1);
        let grid = self.table.grid();
        let divisor = gcd(grid.width, grid.height).max(1);
        let mut instructions = String::new();
        let _ = writeln!(
            instructions,
            "Aspect ratio: {}:{}",
            grid.width / divisor,
            grid.height / divisor
        );
        match self.table.shape() {
            Shape::Rectangle => {
                let top = self.table.iter().filter(|nail| nail.position.y == 0).count();
                let left = self.table.iter().filter(|nail| nail.position.x == 0).count();
                let _ = writeln!(instructions, "Nails on top side (total): {}", top);
                let _ = writeln!(instructions, "Nails on left side (total): {}", left);
            }
            Shape::Circle => {
                let _ = writeln!(instructions, "Nails around the circle: {}", self.table.len());
            }
        }
        instructions.push('\n');

        let columns: Vec<String> = self
            .edges
            .chunks(group)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|edge| format!("{:>3}", edge.from))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        for row in columns.chunks(2) {
            let _ = writeln!(instructions, "{}", row.join("   |   "));
        }
        instructions
    }
}

fn rgb(color: Srgb<u8>) -> String {
    format!("rgb({}, {}, {})", color.red, color.green, color.blue)
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
