use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One line series inside a panel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Column of the output file to plot against the time column.
    pub column: String,
    /// Legend label.
    pub label: String,
    /// Named color ("red", "purple", ...) or "#rrggbb".
    pub color: String,
}

/// One stacked panel of the chart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PanelSpec {
    pub y_label: String,
    pub series: Vec<SeriesSpec>,
}

/// Description of one simulation variant: what the external program prints,
/// how to run it, and how to plot the result.
///
/// The column list must agree positionally with the executable's print order;
/// nothing in the output file declares a schema, so this is the single source
/// of truth for column identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Short name, used as the prefix of every generated file.
    pub name: String,
    /// File name of the simulator source to scrape for parameter labels.
    pub source_file: String,
    /// Executable path relative to the build directory.
    pub executable: String,
    /// Column names, in the exact order the executable emits them.
    pub columns: Vec<String>,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    /// Parameter names (in fixed order) that contribute to file names and
    /// chart titles when the scraper finds them.
    #[serde(default)]
    pub param_keys: Vec<String>,
    pub panels: Vec<PanelSpec>,
    /// Keep every Nth row when plotting.
    #[serde(default = "default_stride")]
    pub stride: usize,
    #[serde(default = "default_x_label")]
    pub x_label: String,
}

fn default_time_column() -> String {
    "Time".to_string()
}

fn default_stride() -> usize {
    1
}

fn default_x_label() -> String {
    "Time".to_string()
}

impl ModelSpec {
    /// Look up a built-in model by name.
    pub fn builtin(name: &str) -> Option<ModelSpec> {
        match name {
            "song-miller-abbott" => Some(song_miller_abbott()),
            "linsker" => Some(linsker()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["song-miller-abbott", "linsker"]
    }

    /// Load a spec from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<ModelSpec> {
        let content = fs::read_to_string(path)?;
        let spec: ModelSpec = serde_json::from_str(&content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check internal consistency before anything is run or parsed.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(DriverError::InvalidSpec(format!(
                "model '{}' declares no columns",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.as_str()) {
                return Err(DriverError::InvalidSpec(format!(
                    "duplicate column '{}'",
                    col
                )));
            }
        }

        if !self.columns.contains(&self.time_column) {
            return Err(DriverError::InvalidSpec(format!(
                "time column '{}' is not in the column list",
                self.time_column
            )));
        }

        for panel in &self.panels {
            for series in &panel.series {
                if !self.columns.contains(&series.column) {
                    return Err(DriverError::InvalidSpec(format!(
                        "panel series references unknown column '{}'",
                        series.column
                    )));
                }
            }
        }

        if self.stride == 0 {
            return Err(DriverError::InvalidSpec(
                "stride must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Two presynaptic neurons driving one postsynaptic neuron through STDP
/// synapses (Song, Miller & Abbott). Currents on top, conductances below.
fn song_miller_abbott() -> ModelSpec {
    ModelSpec {
        name: "songMillerAbbott".to_string(),
        source_file: "songMillerAbbottSynapse.cpp".to_string(),
        executable: "examples/songMillerAbbottSynapse".to_string(),
        columns: ["Time", "vpre1", "vpre2", "vpost", "i1", "i2", "g1", "g2"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        time_column: "Time".to_string(),
        param_keys: [
            "A_minus",
            "A_plus",
            "tau_minus",
            "tau_plus",
            "spike_threshold",
            "g_max",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        panels: vec![
            PanelSpec {
                y_label: "Current (pA)".to_string(),
                series: vec![
                    SeriesSpec {
                        column: "i1".to_string(),
                        label: "i1".to_string(),
                        color: "red".to_string(),
                    },
                    SeriesSpec {
                        column: "i2".to_string(),
                        label: "i2".to_string(),
                        color: "blue".to_string(),
                    },
                ],
            },
            PanelSpec {
                y_label: "Conductance (pS)".to_string(),
                series: vec![
                    SeriesSpec {
                        column: "g1".to_string(),
                        label: "g1".to_string(),
                        color: "red".to_string(),
                    },
                    SeriesSpec {
                        column: "g2".to_string(),
                        label: "g2".to_string(),
                        color: "blue".to_string(),
                    },
                ],
            },
        ],
        stride: 1,
        x_label: "Time (ms)".to_string(),
    }
}

/// Linsker-style weight development run. The output is large (millions of
/// rows), so the default stride thins it before plotting.
fn linsker() -> ModelSpec {
    ModelSpec {
        name: "linsker".to_string(),
        source_file: "linsker.cpp".to_string(),
        executable: "examples/linsker".to_string(),
        columns: [
            "Time", "V1pre", "V2pre", "Vpost", "i1", "i2", "w1", "w2", "SUM(W)",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        time_column: "Time".to_string(),
        param_keys: Vec::new(),
        panels: vec![
            PanelSpec {
                y_label: "Current (i)".to_string(),
                series: vec![
                    SeriesSpec {
                        column: "i1".to_string(),
                        label: "i1".to_string(),
                        color: "red".to_string(),
                    },
                    SeriesSpec {
                        column: "i2".to_string(),
                        label: "i2".to_string(),
                        color: "purple".to_string(),
                    },
                ],
            },
            PanelSpec {
                y_label: "Weight (w)".to_string(),
                series: vec![
                    SeriesSpec {
                        column: "w1".to_string(),
                        label: "w1".to_string(),
                        color: "brown".to_string(),
                    },
                    SeriesSpec {
                        column: "w2".to_string(),
                        label: "w2".to_string(),
                        color: "darkgreen".to_string(),
                    },
                ],
            },
        ],
        stride: 50,
        x_label: "Time (s)".to_string(),
    }
}
