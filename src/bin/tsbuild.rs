//! Binary entry point: wires [`RealHost`], [`JsonManifestParser`], a
//! [`NoopProjectCompiler`] placeholder, and [`SolutionBuilder`] together
//! behind the [`Cli`] surface (spec §6).

use clap::Parser;
use solution_builder::{
    cli::Cli,
    compiler::NoopProjectCompiler,
    context::BuildOptions,
    host::RealHost,
    manifest::JsonManifestParser,
    report::TracingReporter,
    solution::SolutionBuilder,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = RealHost;
    let parser = JsonManifestParser;
    let compiler = NoopProjectCompiler;
    let reporter = TracingReporter::new();
    let options = BuildOptions { dry: cli.dry, force: cli.force, verbose: cli.verbose };

    let builder = SolutionBuilder::new(&host, &parser, &compiler, &reporter, options);
    let specs = cli.project_specs();

    let result = if cli.clean { builder.clean_projects(&specs).map(|_| ()) } else { builder.build_projects(&specs) };

    if let Err(err) = result {
        reporter_error(&reporter, &err.to_string());
    }

    // Exit code nonzero iff any reported diagnostic is of error severity
    // (spec §6), not merely whether this top-level call returned `Err`:
    // most per-project failures are swallowed and surfaced only through
    // the reporter so the rest of the queue still runs.
    if reporter.had_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn reporter_error(reporter: &TracingReporter, message: &str) {
    use solution_builder::report::Reporter;
    reporter.error(message);
}
