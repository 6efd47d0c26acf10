// Library exports for salesplot

pub mod config;
pub mod error;
pub mod graph;
pub mod report;
pub mod selftest;
pub mod table;

pub use config::{OutputFormat, RenderOptions};
pub use error::{ChartError, InvalidDataError, TableError};
pub use report::{
    Bar, ChartHandle, DiagnosticLog, FileSurface, MemoryLog, MemorySurface, NullSurface, Renderer,
    Surface, TracingLog, WriterSurface,
};
pub use table::{Column, ColumnData, Complex, KeyedSeries, Table, ValueKind};
