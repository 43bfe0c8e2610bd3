//! Driver glue around an externally-built Neun synapse simulator: build and
//! run the executable with stdout captured to a text file, scrape its C++
//! source for parameter labels, load the whitespace-delimited output into a
//! table, and render stacked time-series panels to an image file.
//!
//! The numerical integration itself lives entirely in the external program;
//! nothing here models the physics.

mod config;
mod error;
mod plot;
mod runner;
mod scrape;
mod table;

pub use config::{ModelSpec, PanelSpec, SeriesSpec};
pub use error::{DriverError, Result};
pub use plot::{render, PlotFormat, PlotOptions};
pub use runner::{run_simulation, RunOptions, RunOutcome};
pub use scrape::{
    build_suffix, build_title, find_source, scrape_params, scrape_params_file, ParamMap,
};
pub use table::Table;
