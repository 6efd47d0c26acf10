// Validated sales-by-category chart renderer

use crate::config::{OutputFormat, RenderOptions};
use crate::error::{ChartError, InvalidDataError};
use crate::graph::{BarCanvas, BarStyle};
use crate::table::{KeyedSeries, Table};
use anyhow::Context;
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TITLE: &str = "Sales Report by Category";
pub const Y_LABEL: &str = "Sales";

/// Sink for validation failures, injected into the [`Renderer`].
pub trait DiagnosticLog {
    fn error(&self, message: &str);
}

/// Forwards diagnostics to the `tracing` subscriber installed by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl DiagnosticLog for TracingLog {
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: RefCell<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl DiagnosticLog for MemoryLog {
    fn error(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub height: f64,
}

/// The rendered chart: one bar per category, in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartHandle {
    title: String,
    x_label: String,
    y_label: String,
    bars: Vec<Bar>,
}

impl ChartHandle {
    fn from_series(series: KeyedSeries) -> Self {
        let bars = series
            .entries
            .into_iter()
            .map(|(label, height)| Bar { label, height })
            .collect();

        Self {
            title: TITLE.to_string(),
            x_label: series.index_name,
            y_label: Y_LABEL.to_string(),
            bars,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the category column the chart is keyed by.
    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Encode the chart in the format named by `options`.
    pub fn encode(&self, options: &RenderOptions) -> anyhow::Result<Vec<u8>> {
        if options.format == OutputFormat::Json {
            return serde_json::to_vec_pretty(self).context("Failed to serialize chart");
        }

        let canvas = BarCanvas::new(
            options.width,
            options.height,
            &self.title,
            &self.x_label,
            &self.y_label,
            self.bars.iter().map(|b| b.label.clone()).collect(),
            self.bars.iter().map(|b| b.height).collect(),
        )?;
        let style = BarStyle {
            color: Some(options.bar_color.clone()),
            alpha: Some(options.bar_alpha),
            width: Some(options.bar_width),
        };

        match options.format {
            OutputFormat::Svg => Ok(canvas.render_svg(&style)?.into_bytes()),
            _ => canvas.render_png(&style),
        }
    }
}

/// Output surface a finished chart is shown on.
pub trait Surface {
    fn show(&mut self, chart: &ChartHandle) -> anyhow::Result<()>;
}

/// Discards every chart.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn show(&mut self, _chart: &ChartHandle) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    shown: Vec<ChartHandle>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> &[ChartHandle] {
        &self.shown
    }
}

impl Surface for MemorySurface {
    fn show(&mut self, chart: &ChartHandle) -> anyhow::Result<()> {
        self.shown.push(chart.clone());
        Ok(())
    }
}

/// Encodes each chart and writes it to `W`, flushing after every chart.
pub struct WriterSurface<W: Write> {
    writer: W,
    options: RenderOptions,
}

impl<W: Write> WriterSurface<W> {
    pub fn new(writer: W, options: RenderOptions) -> Self {
        Self { writer, options }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Surface for WriterSurface<W> {
    fn show(&mut self, chart: &ChartHandle) -> anyhow::Result<()> {
        let bytes = chart.encode(&self.options)?;
        self.writer
            .write_all(&bytes)
            .context("Failed to write chart")?;
        self.writer.flush().context("Failed to flush chart output")?;
        Ok(())
    }
}

/// Writes each chart to a file. The file is only created once the chart
/// has been encoded, so a rejected table leaves an existing file untouched.
#[derive(Debug)]
pub struct FileSurface {
    path: PathBuf,
    options: RenderOptions,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>, options: RenderOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Surface for FileSurface {
    fn show(&mut self, chart: &ChartHandle) -> anyhow::Result<()> {
        let bytes = chart.encode(&self.options)?;
        std::fs::write(&self.path, bytes)
            .with_context(|| format!("Failed to write output file '{}'", self.path.display()))
    }
}

pub struct Renderer<L, S> {
    log: L,
    surface: S,
}

impl<L: DiagnosticLog, S: Surface> Renderer<L, S> {
    pub fn new(log: L, surface: S) -> Self {
        Self { log, surface }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_parts(self) -> (L, S) {
        (self.log, self.surface)
    }

    /// Validate `table` and draw one bar per category.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// 1. the table is empty, or `sales_col` is not numeric
    ///    (the sales column is not looked up for an empty table);
    /// 2. `category_col` contains a repeated value.
    ///
    /// A missing column surfaces as [`ChartError::ColumnNotFound`] from
    /// whichever step first looks it up. Nothing is shown unless every check passes.
    pub fn render(
        &mut self,
        table: &Table,
        category_col: &str,
        sales_col: &str,
    ) -> Result<ChartHandle, ChartError> {
        debug!(
            rows = table.height(),
            category_col, sales_col, "Validating sales table"
        );

        if table.is_empty() || !table.column(sales_col)?.kind().is_numeric() {
            return Err(self.reject(InvalidDataError::EmptyOrNonNumeric));
        }

        if table.column(category_col)?.has_duplicates() {
            return Err(self.reject(InvalidDataError::DuplicateCategories));
        }

        let series = table.set_index(category_col, sales_col)?;
        let chart = ChartHandle::from_series(series);
        debug!(bars = chart.bars().len(), "Rendering sales chart");

        self.surface.show(&chart).map_err(ChartError::Display)?;
        Ok(chart)
    }

    fn reject(&self, err: InvalidDataError) -> ChartError {
        self.log.error(&err.to_string());
        err.into()
    }
}
