//! Export core modules shared by the CLI and its tests.

pub mod pdf_core;
pub mod sheet;

#[cfg(feature = "excel")]
pub mod excel_core;
