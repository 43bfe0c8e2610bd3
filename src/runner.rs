use crate::error::{DriverError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How one build-and-run cycle of the external simulator is performed.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Directory the build command runs in.
    pub build_dir: PathBuf,
    /// Build invocation, e.g. "make" or "ninja -j4". Empty skips the build.
    pub build_command: String,
    /// Simulator executable, relative to the build directory (or absolute).
    pub executable: PathBuf,
    /// Where the simulator's stdout goes.
    pub output_path: PathBuf,
    /// Fall back to a pre-existing output file when the build or the
    /// simulation fails, instead of aborting. Off by default: stale data is
    /// only ever plotted when asked for.
    pub tolerate_failure: bool,
    pub verbose: bool,
}

impl RunOptions {
    pub fn new(
        build_dir: impl Into<PathBuf>,
        executable: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            build_command: "make".to_string(),
            executable: executable.into(),
            output_path: output_path.into(),
            tolerate_failure: false,
            verbose: false,
        }
    }
}

/// What actually happened to the output file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The simulator ran and the output file is freshly written.
    Fresh,
    /// This run failed but an earlier output file is being reused.
    StaleTolerated,
}

/// Build the simulator, then run it with stdout redirected to the output
/// path. No retry, no timeout: a nonzero exit at either stage is fatal,
/// unless `tolerate_failure` allows falling back to an earlier output file.
///
/// The fresh output is written next to the target and renamed into place on
/// success, so a failed run never clobbers the previous one.
pub fn run_simulation(opts: &RunOptions) -> Result<RunOutcome> {
    if !opts.build_dir.is_dir() {
        return Err(DriverError::BuildDirNotFound(opts.build_dir.clone()));
    }

    match run_fresh(opts) {
        Ok(()) => {
            if opts.verbose {
                println!("Data saved in: {}", opts.output_path.display());
            }
            Ok(RunOutcome::Fresh)
        }
        Err(err @ DriverError::ProcessFailed { .. })
            if opts.tolerate_failure && has_prior_output(&opts.output_path) =>
        {
            eprintln!(
                "warning: {}; plotting stale data from {}",
                err,
                opts.output_path.display()
            );
            Ok(RunOutcome::StaleTolerated)
        }
        Err(err) => Err(err),
    }
}

fn run_fresh(opts: &RunOptions) -> Result<()> {
    run_build(opts)?;

    let exe = if opts.executable.is_absolute() {
        opts.executable.clone()
    } else {
        opts.build_dir.join(&opts.executable)
    };
    if !exe.is_file() {
        return Err(DriverError::ExecutableNotFound(exe));
    }

    if let Some(parent) = opts.output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    if opts.verbose {
        println!("Running {} > {}", exe.display(), opts.output_path.display());
    }

    // The executable runs in its own directory, as a manual
    // `cd examples && ./model > out.txt` would.
    let exe_dir = exe.parent().unwrap_or(Path::new("."));
    let partial_path = opts.output_path.with_extension("partial");
    let stdout_file = fs::File::create(&partial_path)?;

    let output = Command::new(&exe)
        .current_dir(exe_dir)
        .stdout(Stdio::from(stdout_file))
        .output()?;

    if !output.status.success() {
        let _ = fs::remove_file(&partial_path);
        return Err(DriverError::ProcessFailed {
            stage: "simulation",
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    fs::rename(&partial_path, &opts.output_path)?;
    Ok(())
}

fn run_build(opts: &RunOptions) -> Result<()> {
    let mut parts = opts.build_command.split_whitespace();
    let Some(program) = parts.next() else {
        // Empty build command means the executable is prebuilt.
        return Ok(());
    };

    if opts.verbose {
        println!(
            "Building with '{}' in {}",
            opts.build_command,
            opts.build_dir.display()
        );
    }

    let output = Command::new(program)
        .args(parts)
        .current_dir(&opts.build_dir)
        .output()?;

    if !output.status.success() {
        return Err(DriverError::ProcessFailed {
            stage: "build",
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

fn has_prior_output(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn opts(dir: &Path, exe: &str, out: &Path) -> RunOptions {
        let mut opts = RunOptions::new(dir, exe, out);
        opts.build_command = "true".to_string();
        opts
    }

    fn seed_output(path: &Path, content: &str) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn redirects_stdout_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results/run.txt");
        let outcome = run_simulation(&opts(dir.path(), "/bin/echo", &out)).unwrap();

        assert_eq!(outcome, RunOutcome::Fresh);
        // echo with no args prints a single newline.
        assert_eq!(fs::read_to_string(&out).unwrap(), "\n");
        assert!(!out.with_extension("partial").exists());
    }

    #[test]
    fn missing_build_dir_is_fatal() {
        let err = run_simulation(&opts(
            Path::new("/no/such/build"),
            "/bin/echo",
            Path::new("/tmp/neunplot-unused.txt"),
        ))
        .unwrap_err();
        assert!(matches!(err, DriverError::BuildDirNotFound(_)));
    }

    #[test]
    fn missing_executable_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        let err = run_simulation(&opts(dir.path(), "examples/model", &out)).unwrap_err();
        assert!(matches!(err, DriverError::ExecutableNotFound(_)));
    }

    #[test]
    fn failed_build_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        let mut opts = opts(dir.path(), "/bin/echo", &out);
        opts.build_command = "false".to_string();

        let err = run_simulation(&opts).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ProcessFailed { stage: "build", .. }
        ));
    }

    #[test]
    fn failed_simulation_is_fatal_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        let err = run_simulation(&opts(dir.path(), "/bin/false", &out)).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ProcessFailed {
                stage: "simulation",
                ..
            }
        ));
    }

    #[test]
    fn tolerate_failure_reuses_prior_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        seed_output(&out, "Time v\n0.0 1.0\n");

        let mut opts = opts(dir.path(), "/bin/false", &out);
        opts.tolerate_failure = true;

        let outcome = run_simulation(&opts).unwrap();
        assert_eq!(outcome, RunOutcome::StaleTolerated);
        // The prior data survived the failed run untouched.
        assert_eq!(fs::read_to_string(&out).unwrap(), "Time v\n0.0 1.0\n");
    }

    #[test]
    fn tolerate_failure_covers_build_failures_too() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        seed_output(&out, "Time v\n0.0 1.0\n");

        let mut opts = opts(dir.path(), "/bin/echo", &out);
        opts.build_command = "false".to_string();
        opts.tolerate_failure = true;

        assert_eq!(run_simulation(&opts).unwrap(), RunOutcome::StaleTolerated);
    }

    #[test]
    fn tolerate_failure_without_prior_output_still_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        let mut opts = opts(dir.path(), "/bin/false", &out);
        opts.tolerate_failure = true;

        let err = run_simulation(&opts).unwrap_err();
        assert!(matches!(err, DriverError::ProcessFailed { .. }));
    }

    #[test]
    fn empty_build_command_skips_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.txt");
        let mut opts = opts(dir.path(), "/bin/echo", &out);
        opts.build_command = String::new();

        assert_eq!(run_simulation(&opts).unwrap(), RunOutcome::Fresh);
    }
}
