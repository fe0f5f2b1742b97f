use std::io::Write;

use ltl2buchi::{graph::io::read_file, prelude::*};

use tracing::{debug, error, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgAction, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("sccreduce")
        .about("Removes useless states and acceptance marks from a Büchi graph")
        .arg(
            Arg::new("file")
                .help("the graph to reduce, standard input if omitted")
                .num_args(0..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .action(ArgAction::SetTrue)
                .help("print a summary of the reduction to stderr"),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => return,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn run(file: Option<&String>, stats: bool) -> Result<()> {
    let mut graph = match file {
        Some(path) => {
            debug!("reading graph from {path}");
            read_file(path)?
        }
        None => {
            debug!("reading graph from stdin");
            read_graph(std::io::stdin().lock())?
        }
    };

    let summary = reduce(&mut graph);
    if stats {
        eprintln!("{summary}");
    }

    let mut stdout = std::io::stdout().lock();
    write_graph(&graph, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

pub fn main() {
    let mut command = cli();
    let matches = command.get_matches_mut();

    setup_logging(&matches);

    let files = matches
        .get_many::<String>("file")
        .map(|files| files.collect::<Vec<_>>())
        .unwrap_or_default();
    if files.len() > 1 {
        println!("{}", command.render_usage());
        return;
    }

    if let Err(e) = run(files.first().copied(), matches.get_flag("stats")) {
        error!("reduction failed: {e}");
        eprintln!("can't load the graph: {e}");
        std::process::exit(1);
    }
}
