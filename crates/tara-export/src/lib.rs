//! TARA Graphviz Export
//!
//! Renders attack trees as DOT graphs for visual review.
//!
//! # Core Concepts
//!
//! - [`DotExporter::risk_view`]: Original likelihood, impact and R per node
//! - [`DotExporter::residual_view`]: Adds residual likelihood, RR and the treatment
//! - [`DotOptions`]: Tree filter, decimal separator and [`Palette`]
//!
//! # Example
//!
//! ```rust,ignore
//! use tara_export::{DotExporter, DotOptions};
//!
//! let exporter = DotExporter::new(&engine, DotOptions::default().tree("R01"));
//! if let Some(dot) = exporter.residual_view(&mut analysis)? {
//!     std::fs::write("R01_residual.dot", dot)?;
//! }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod dot;
mod error;
mod options;

pub use dot::{clean_label, safe_id, DotExporter};
pub use error::{ExportError, ExportResult};
pub use options::{DotOptions, Palette};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
