//! Pipeline module.
//!
//! This module provides the drilling data processor, its builder and file I/O.

mod builder;
pub mod io;
mod processor;

pub use builder::DrillingProcessorBuilder;
pub use io::FileFormat;
pub use processor::{DrillingProcessor, ProcessorState};
