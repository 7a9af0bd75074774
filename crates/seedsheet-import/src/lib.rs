//! Reads filled-in workbooks back into binding models and renders them as
//! Rust seed-data source.

pub mod codegen;
pub mod errors;
pub mod extractor;
pub mod generate;
pub mod model;
pub mod render;

pub use errors::ImportError;
pub use extractor::BindingExtractor;
pub use generate::{Flavor, GeneratedSource, SeedSourceGenerator};
pub use model::{ColumnBinding, Extraction, ImportIssue, ImportOptions, TableBinding};
pub use render::TemplateRenderer;
