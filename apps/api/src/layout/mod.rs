// Document layout: font metrics, wrapping, block production, page packing, PDF flattening.
// Pure and synchronous. Async callers run it inside tokio::task::spawn_blocking.

pub mod blocks;
pub mod engine;
pub mod font_metrics;
pub mod format;
pub mod glyphs;
pub mod paginate;
pub mod pdf;
pub mod primitives;
pub mod wrap;

pub use engine::render;
pub use font_metrics::{GlyphPolicy, PageConfig, PageSize};
pub use pdf::{pdf_filename, render_pdf};
