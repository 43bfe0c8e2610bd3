use clap::{Parser, ValueEnum};
use neunplot::{
    build_suffix, build_title, find_source, run_simulation, scrape_params_file, DriverError,
    ModelSpec, PlotFormat, PlotOptions, Result, RunOptions, Table,
};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Svg,
}

impl From<Format> for PlotFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png => PlotFormat::Png,
            Format::Svg => PlotFormat::Svg,
        }
    }
}

/// Build and run a Neun synapse simulation, then plot the captured output.
#[derive(Parser)]
#[command(name = "neunplot", version, about)]
struct Cli {
    /// Built-in model preset (song-miller-abbott, linsker)
    #[arg(short, long, default_value = "song-miller-abbott", conflicts_with = "spec")]
    model: String,

    /// JSON model spec file instead of a built-in preset
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Root of the Neun checkout (source scraping + build directory)
    #[arg(long, default_value = "../Neun")]
    sim_root: PathBuf,

    /// Build directory; defaults to <sim-root>/build
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Build command run before the simulation; empty string skips the build
    #[arg(long, default_value = "make")]
    build_command: String,

    /// Plot an existing output file instead of building and running
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory for captured simulation output
    #[arg(long, default_value = "results/txt")]
    txt_dir: PathBuf,

    /// Directory for rendered charts
    #[arg(long, default_value = "results/plots")]
    plot_dir: PathBuf,

    /// Keep every Nth row when plotting (overrides the model's default)
    #[arg(long)]
    stride: Option<usize>,

    /// Image format
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// Image width in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Plot stale data from a previous run when the build or simulation fails
    #[arg(long)]
    tolerate_stale: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let spec = load_spec(cli)?;

    // A pre-existing data file short-circuits scraping and running; its stem
    // names the plot.
    if let Some(data) = &cli.data {
        let base = data
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&spec.name)
            .to_string();
        let table = Table::from_path(data, &spec.columns)?;
        let plot_path = render_chart(cli, &spec, &table, &base, spec.name.clone())?;
        println!(" -> Data: {}\n -> Plot: {}", data.display(), plot_path.display());
        return Ok(());
    }

    // Scrape the simulator source for the parameter values that label this run.
    if cli.verbose {
        println!("=== SCRAPING PARAMETERS ===");
    }
    let source_path = find_source(&cli.sim_root, &spec.source_file)?;
    let params = scrape_params_file(&source_path)?;
    if cli.verbose {
        println!("Source: {}", source_path.display());
        for (name, value) in &params {
            println!("  {} = {}", name, value);
        }
    }

    let suffix = build_suffix(&params, &spec.param_keys);
    let title = build_title(&params, &spec.param_keys);
    let base = format!("{}_{}", spec.name, suffix);

    // Build and run, stdout captured to the txt file.
    if cli.verbose {
        println!("\n=== RUNNING SIMULATION ===");
    }
    fs::create_dir_all(&cli.txt_dir)?;
    let txt_path = cli.txt_dir.join(format!("{}.txt", base));

    let mut run_opts = RunOptions::new(
        cli.build_dir
            .clone()
            .unwrap_or_else(|| cli.sim_root.join("build")),
        &spec.executable,
        &txt_path,
    );
    run_opts.build_command = cli.build_command.clone();
    run_opts.tolerate_failure = cli.tolerate_stale;
    run_opts.verbose = cli.verbose;
    run_simulation(&run_opts)?;

    // Load, decimate, render.
    if cli.verbose {
        println!("\n=== RENDERING ===");
    }
    let table = Table::from_path(&txt_path, &spec.columns)?;
    let chart_title = if title.is_empty() {
        spec.name.clone()
    } else {
        title
    };
    let plot_path = render_chart(cli, &spec, &table, &base, chart_title)?;

    println!(
        " -> Data: {}\n -> Plot: {}",
        txt_path.display(),
        plot_path.display()
    );
    Ok(())
}

fn load_spec(cli: &Cli) -> Result<ModelSpec> {
    if let Some(path) = &cli.spec {
        return ModelSpec::from_json_file(path);
    }
    ModelSpec::builtin(&cli.model).ok_or_else(|| DriverError::UnknownModel(cli.model.clone()))
}

fn render_chart(
    cli: &Cli,
    spec: &ModelSpec,
    table: &Table,
    base: &str,
    title: String,
) -> Result<PathBuf> {
    let stride = cli.stride.unwrap_or(spec.stride);
    let plotted = table.decimate(stride);
    if cli.verbose {
        println!(
            "Plotting {} of {} rows (stride {})",
            plotted.num_rows(),
            table.num_rows(),
            stride
        );
    }

    let opts = PlotOptions {
        width: cli.width,
        height: cli.height,
        format: cli.format.into(),
        title,
        x_label: spec.x_label.clone(),
    };

    fs::create_dir_all(&cli.plot_dir)?;
    let plot_path = cli
        .plot_dir
        .join(format!("{}.{}", base, opts.format.extension()));
    neunplot::render(&plotted, spec, &opts, &plot_path)?;
    Ok(plot_path)
}
