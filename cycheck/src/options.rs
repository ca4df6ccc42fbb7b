use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "cycheck",
    about = "Infinite-descent soundness checking for heighted graphs."
)]
pub struct Options {
    /// The graph to check: a JSON file with a "Node" table of
    /// [id, [height, ...]] entries and an "Edge" table of
    /// [[src, dst], [[src_h, dst_h, slope], ...]] entries
    /// (slope 1 = stay, 2 = decrease).
    #[structopt(parse(from_os_str))]
    pub graph: PathBuf,

    /// Check options as flag letters, in any order.
    /// f: fail fast. s: SCC self-loop test. i: idempotent-only checking.
    /// m: minimality pruning. O: order-reduced strategy.
    /// K: Floyd-Warshall-Kleene strategy. A: automata-theoretic check.
    /// Default is the relational check with no optimisations.
    #[structopt(short = "F", long = "flags", default_value = "")]
    pub flags: String,

    /// Print check statistics after the verdict.
    #[structopt(long = "stats")]
    pub stats: bool,

    /// Only print the bare verdict; no spinner, no styling.
    #[structopt(short = "q", long = "quiet")]
    pub quiet: bool,
}
