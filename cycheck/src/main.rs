use std::fs;
use std::process;

use console::style;
use indicatif::ProgressBar;
use structopt::StructOpt;

use descent::{CheckStats, Flags, HeightedGraph};
use omega::OmegaBackend;

use crate::input::parse_graph;
use crate::options::Options;

mod input;
mod options;

fn main() {
    let opts = Options::from_args();
    process::exit(run(opts));
}

/// Exit codes: 0 sound, 1 unsound, 2 for anything that kept a verdict from
/// being reached.
fn run(opts: Options) -> i32 {
    let flags = match Flags::from_letters(&opts.flags) {
        Ok(flags) => flags,
        Err(err) => {
            eprintln!("{}", err);
            return 2;
        }
    };
    if flags.intersects(Flags::USE_SD | Flags::USE_XSD) {
        eprintln!("the D and X check modes name procedures this tool does not provide");
        return 2;
    }

    let text = match fs::read_to_string(&opts.graph) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("cannot read {}: {}", opts.graph.display(), err);
            return 2;
        }
    };
    let graph = match parse_graph(&text) {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("{}", err);
            return 2;
        }
    };

    let spinner = if opts.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_message(&format!(
            "Checking {} nodes, {} edges ({})",
            graph.num_nodes(),
            graph.num_edges(),
            mode_name(flags)
        ));
        pb.enable_steady_tick(200);
        Some(pb)
    };

    let mut stats = CheckStats::default();
    let verdict = dispatch(&graph, flags, &mut stats);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match verdict {
        Ok(sound) => {
            if opts.quiet {
                println!("{}", if sound { "SOUND" } else { "UNSOUND" });
            } else if sound {
                println!("{}", style("SOUND").green().bold());
            } else {
                println!("{}", style("UNSOUND").red().bold());
            }
            if opts.stats {
                if flags.contains(Flags::USE_SLA) {
                    eprintln!("(no closure statistics in automata mode)");
                } else {
                    print!("{}", stats);
                }
            }
            if sound {
                0
            } else {
                1
            }
        }
        Err(err) => {
            eprintln!("{}", err);
            2
        }
    }
}

fn dispatch(
    graph: &HeightedGraph,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<bool, descent::CheckError> {
    if flags.contains(Flags::USE_SLA) {
        let mut backend = OmegaBackend::new();
        graph.sla_automata_check(&mut backend)
    } else if flags.contains(Flags::USE_FWK) {
        graph.fwk_check_with_stats(flags, stats)
    } else if flags.contains(Flags::USE_ORTL) {
        graph.order_reduced_check_with_stats(flags, stats)
    } else {
        graph.relational_check_with_stats(flags, stats)
    }
}

fn mode_name(flags: Flags) -> &'static str {
    if flags.contains(Flags::USE_SLA) {
        "automata"
    } else if flags.contains(Flags::USE_FWK) {
        "floyd-warshall-kleene"
    } else if flags.contains(Flags::USE_ORTL) {
        "order-reduced"
    } else {
        "relational"
    }
}
