// Enable warnings for all clippy lints.
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::cargo,
    clippy::restriction
)]
// Now selectively disable unneeded lints.
#![allow(
    clippy::implicit_return,
    clippy::missing_docs_in_private_items,
    clippy::blanket_clippy_restriction_lints,
    clippy::pattern_type_mismatch,
    clippy::exhaustive_enums,
    clippy::default_numeric_fallback
)]
// Mark some lints as errors.
#![deny(clippy::print_stdout)]

use clap::{arg_enum, App, Arg, ArgMatches};
use deltasurge::config::{Algo, GraphFormat, RunConfig};
use deltasurge::error::{config_error, DeltaSurgeError};
use deltasurge::util::logger::init_logger_with_level;
use deltasurge::ExecuteOptions;
use ds_engine_api::VertexId;
use log::{info, Level};
use std::str::FromStr;

arg_enum! {
    #[derive(PartialEq, Debug)]
    pub enum LogLevel {
        Error,
        Warn,
        Info,
        Debug,
        Trace,
    }
}

fn main() -> Result<(), DeltaSurgeError> {
    // Parse command line arguments.
    let matches = App::new("deltasurge")
        .args_from_usage("<graph> 'Path to the input graph'")
        .arg(
            Arg::from_usage("-f, --format=[FORMAT] 'Input graph format'")
                .possible_values(&GraphFormat::variants())
                .case_insensitive(true),
        )
        .arg(
            Arg::from_usage("-a, --algo=[ALGO] 'Engine variant to run'")
                .possible_values(&Algo::variants())
                .case_insensitive(true),
        )
        .args_from_usage(
            "-s, --startNode=[ID] 'Vertex to start the search from'
             -r, --reportNode=[ID] 'Vertex to report the distance to'
             -d, --delta=[SHIFT] 'Shift value for the delta step'
             -t, --threads=[N] 'Number of worker threads'
             --skipVerify 'Skip the post-run verification'
             --saveBin=[FILE] 'Serialize the loaded graph to a binary cache'
             --output=[FILE] 'Write the computed distances to a file'",
        )
        .arg(
            Arg::from_usage("-l, --loglevel=[LEVEL] 'Set the log level'")
                .possible_values(&LogLevel::variants())
                .case_insensitive(true),
        )
        .get_matches();

    setup_logger(&matches)?;

    let config = RunConfig::new(
        arg_or(&matches, "algo", Algo::AsyncWithCas)?,
        arg_or::<VertexId>(&matches, "startNode", 0)?,
        arg_or::<VertexId>(&matches, "reportNode", 1)?,
        arg_or::<u32>(&matches, "delta", 10)?,
        arg_or::<usize>(&matches, "threads", 1)?,
        matches.is_present("skipVerify"),
    );
    let options = ExecuteOptions::new(
        matches.value_of("graph").expect("Required argument").to_string(),
        arg_or(&matches, "format", GraphFormat::Gr)?,
        config,
        matches.value_of("saveBin").map(str::to_string),
        matches.value_of("output").map(str::to_string),
    );

    let result = deltasurge::execute(&options)?;
    info!(
        "Done: {} iterations, {} empty work, {} bad work in {}",
        result.iterations,
        result.empty_work,
        result.bad_work,
        result.operator_time.seconds_string()
    );
    Ok(())
}

fn arg_or<T: FromStr>(
    matches: &ArgMatches,
    name: &str,
    default: T,
) -> Result<T, DeltaSurgeError> {
    match matches.value_of(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| config_error(format!("Could not parse --{} value '{}'", name, value))),
    }
}

fn setup_logger(matches: &ArgMatches) -> Result<(), DeltaSurgeError> {
    // Set log level.
    let log_level = match arg_or(matches, "loglevel", LogLevel::Info)? {
        LogLevel::Error => Level::Error,
        LogLevel::Warn => Level::Warn,
        LogLevel::Info => Level::Info,
        LogLevel::Debug => Level::Debug,
        LogLevel::Trace => Level::Trace,
    };
    init_logger_with_level(log_level)
}
