use crate::config::ModelSpec;
use crate::error::{DriverError, Result};
use crate::table::Table;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt;
use std::path::Path;

/// Image format of the saved chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotFormat {
    Png,
    Svg,
}

impl PlotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PlotFormat::Png => "png",
            PlotFormat::Svg => "svg",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub format: PlotFormat,
    /// Caption over the top panel; empty for none.
    pub title: String,
    /// X-axis description under the bottom panel.
    pub x_label: String,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            format: PlotFormat::Png,
            title: String::new(),
            x_label: "Time".to_string(),
        }
    }
}

/// Render the table as vertically stacked line-chart panels sharing the time
/// axis, one panel per `PanelSpec`, and save the image at `out_path`.
///
/// Down-sampling is the caller's concern: the table arrives already
/// decimated.
pub fn render(table: &Table, spec: &ModelSpec, opts: &PlotOptions, out_path: &Path) -> Result<()> {
    if spec.panels.is_empty() {
        return Err(DriverError::InvalidSpec(format!(
            "model '{}' declares no panels",
            spec.name
        )));
    }

    match opts.format {
        PlotFormat::Png => {
            let root =
                BitMapBackend::new(out_path, (opts.width, opts.height)).into_drawing_area();
            draw_panels(&root, table, spec, opts)?;
            root.present().map_err(render_err)?;
        }
        PlotFormat::Svg => {
            let root = SVGBackend::new(out_path, (opts.width, opts.height)).into_drawing_area();
            draw_panels(&root, table, spec, opts)?;
            root.present().map_err(render_err)?;
        }
    }

    Ok(())
}

fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    table: &Table,
    spec: &ModelSpec,
    opts: &PlotOptions,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;
    let areas = root.split_evenly((spec.panels.len(), 1));

    let time = table.column(&spec.time_column)?;
    let (x_min, x_max) = value_span(&time);

    for (idx, (panel, area)) in spec.panels.iter().zip(areas.iter()).enumerate() {
        let last = idx == spec.panels.len() - 1;

        // Gather the panel's series up front so the y range covers all of them.
        let mut series = Vec::with_capacity(panel.series.len());
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for s in &panel.series {
            let values = table.column(&s.column)?;
            let (lo, hi) = value_span(&values);
            y_min = y_min.min(lo);
            y_max = y_max.max(hi);

            let points: Vec<(f64, f64)> = time.iter().copied().zip(values).collect();
            series.push((s.label.clone(), parse_color(&s.color)?, points));
        }
        let (y_min, y_max) = pad_range(y_min, y_max);

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(10)
            .x_label_area_size(if last { 40 } else { 20 })
            .y_label_area_size(60);
        if idx == 0 && !opts.title.is_empty() {
            builder.caption(opts.title.as_str(), ("sans-serif", 18));
        }

        let mut chart = builder
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(render_err)?;

        let mut mesh = chart.configure_mesh();
        mesh.y_desc(panel.y_label.as_str())
            .light_line_style(BLACK.mix(0.08))
            .bold_line_style(BLACK.mix(0.15));
        if last {
            mesh.x_desc(opts.x_label.as_str());
        }
        mesh.draw().map_err(render_err)?;

        for (label, color, points) in series {
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(render_err)?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}

/// Finite min/max of a slice, widened if degenerate so the axis always has
/// a usable extent.
fn value_span(values: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

fn pad_range(lo: f64, hi: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Resolve a series color: a known name or "#rrggbb" hex.
pub fn parse_color(name: &str) -> Result<RGBColor> {
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() == 6 {
            let parse = |s: &str| u8::from_str_radix(s, 16);
            if let (Ok(r), Ok(g), Ok(b)) = (parse(&hex[0..2]), parse(&hex[2..4]), parse(&hex[4..6]))
            {
                return Ok(RGBColor(r, g, b));
            }
        }
        return Err(DriverError::InvalidSpec(format!(
            "invalid hex color '{}'",
            name
        )));
    }

    match name.to_ascii_lowercase().as_str() {
        "black" => Ok(RGBColor(0, 0, 0)),
        "red" => Ok(RGBColor(220, 30, 30)),
        "blue" => Ok(RGBColor(30, 60, 220)),
        "green" => Ok(RGBColor(30, 160, 30)),
        "darkgreen" => Ok(RGBColor(0, 100, 0)),
        "purple" => Ok(RGBColor(128, 0, 128)),
        "brown" => Ok(RGBColor(150, 75, 0)),
        "orange" => Ok(RGBColor(255, 140, 0)),
        "gray" | "grey" => Ok(RGBColor(128, 128, 128)),
        _ => Err(DriverError::InvalidSpec(format!(
            "unknown color '{}'",
            name
        ))),
    }
}

fn render_err<E: fmt::Display>(err: E) -> DriverError {
    DriverError::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_hex_colors_parse() {
        let RGBColor(r, g, b) = parse_color("darkgreen").unwrap();
        assert_eq!((r, g, b), (0, 100, 0));
        let RGBColor(r, g, b) = parse_color("#ff00aa").unwrap();
        assert_eq!((r, g, b), (255, 0, 170));
        assert!(parse_color("chartreuse-ish").is_err());
        assert!(parse_color("#12345").is_err());
    }

    #[test]
    fn spans_ignore_non_finite_values() {
        assert_eq!(value_span(&[1.0, f64::NAN, 3.0]), (1.0, 3.0));
        assert_eq!(value_span(&[f64::NAN]), (0.0, 1.0));
        assert_eq!(value_span(&[2.0, 2.0]), (1.5, 2.5));
    }

    #[test]
    fn pad_range_widens_degenerate_ranges() {
        assert_eq!(pad_range(5.0, 5.0), (4.5, 5.5));
        let (lo, hi) = pad_range(0.0, 10.0);
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn format_extensions() {
        assert_eq!(PlotFormat::Png.extension(), "png");
        assert_eq!(PlotFormat::Svg.extension(), "svg");
    }
}
