use crate::config::MAX_PIXELS;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

/// Style configuration for the bar series
#[derive(Debug, Clone)]
pub struct BarStyle {
    pub color: Option<String>,
    pub alpha: Option<f64>,
    pub width: Option<f64>,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            color: None,
            alpha: None,
            width: Some(0.8),
        }
    }
}

/// Canvas for a single categorical bar chart.
///
/// Category `i` is centered on x = i, so integer ticks line up with bars.
#[derive(Debug)]
pub struct BarCanvas {
    width: u32,
    height: u32,
    title: String,
    x_desc: String,
    y_desc: String,
    categories: Vec<String>,
    values: Vec<f64>,
    y_range: Range<f64>,
}

impl BarCanvas {
    pub fn new(
        width: u32,
        height: u32,
        title: &str,
        x_desc: &str,
        y_desc: &str,
        categories: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if categories.len() != values.len() {
            anyhow::bail!(
                "Categories and Y data must have the same length (categories: {}, y: {})",
                categories.len(),
                values.len()
            );
        }

        if categories.is_empty() {
            anyhow::bail!("Cannot create bar chart with no data");
        }

        if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_PIXELS {
            anyhow::bail!(
                "Canvas of {}x{} is outside the supported size (1 to {} pixels)",
                width,
                height,
                MAX_PIXELS
            );
        }

        Ok(BarCanvas {
            width,
            height,
            title: title.to_string(),
            x_desc: x_desc.to_string(),
            y_desc: y_desc.to_string(),
            y_range: y_range(&values),
            categories,
            values,
        })
    }

    pub fn y_range(&self) -> Range<f64> {
        self.y_range.clone()
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, style: &BarStyle) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE).context("Failed to fill background")?;

        let num_categories = self.categories.len();
        let x_range = -0.5..(num_categories as f64 - 0.5);

        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .caption(&self.title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, self.y_range.clone())
            .context("Failed to build chart")?;

        let categories = &self.categories;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(num_categories)
            .x_label_formatter(&|x: &f64| {
                let idx = x.round();
                if (x - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                categories.get(idx as usize).cloned().unwrap_or_default()
            })
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .draw()
            .context("Failed to draw mesh")?;

        let color = parse_color(&style.color).mix(style.alpha.unwrap_or(1.0));
        let bar_width = style.width.unwrap_or(0.8);

        // NaN heights leave a gap
        chart
            .draw_series(
                self.values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(idx, &y_val)| {
                        let x_center = idx as f64;
                        Rectangle::new(
                            [
                                (x_center - bar_width / 2.0, 0.0),
                                (x_center + bar_width / 2.0, y_val),
                            ],
                            color.filled(),
                        )
                    }),
            )
            .context("Failed to draw bars")?;

        root.present().context("Failed to present drawing")?;

        Ok(())
    }

    /// Draw and encode the chart as PNG
    pub fn render_png(&self, style: &BarStyle) -> Result<Vec<u8>> {
        let len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .context("Canvas is too large to allocate")?;
        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, style)?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    /// Draw the chart as an SVG document
    pub fn render_svg(&self, style: &BarStyle) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, style)?;
        }
        Ok(svg)
    }
}

/// Y range over the finite values, always including the zero baseline
fn y_range(values: &[f64]) -> Range<f64> {
    let (y_min, y_max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if y_min == y_max {
        (y_min - 1.0)..(y_max + 1.0)
    } else {
        let padding = (y_max - y_min) * 0.05;
        let lower = if y_min < 0.0 { y_min - padding } else { 0.0 };
        let upper = if y_max > 0.0 { y_max + padding } else { 0.0 };
        lower..upper
    }
}

/// Parse color string to RGBColor
pub fn parse_color(color_str: &Option<String>) -> RGBColor {
    match color_str.as_deref() {
        Some("red") => RED,
        Some("green") => GREEN,
        Some("blue") => BLUE,
        Some("black") => BLACK,
        Some("yellow") => YELLOW,
        Some("cyan") => CYAN,
        Some("magenta") => MAGENTA,
        Some("white") => WHITE,
        Some(hex) if hex.starts_with('#') && hex.len() == 7 && hex.is_ascii() => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            match (channel(1), channel(3), channel(5)) {
                (Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
                _ => BLUE,
            }
        }
        _ => BLUE, // default
    }
}
