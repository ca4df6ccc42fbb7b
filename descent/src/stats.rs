use std::fmt::{self, Formatter};
use std::time::Duration;

/// Counters and timings gathered while a check runs.
///
/// Every closure engine fills one of these as it goes; the cheap way to get
/// one is to call the `*_check_with_stats` variants on
/// [`HeightedGraph`](crate::graph::HeightedGraph). All counters are totals
/// over the whole check, including work on relations that were later
/// rejected or pruned.
#[derive(Debug, Default, Clone)]
pub struct CheckStats {
    /// Number of edge relations seeding the closure.
    pub initial_size: usize,
    /// Number of relations in the closure when the check ended.
    pub final_size: usize,
    /// Candidates rejected by the dedup set or by an existing smaller relation.
    pub rejections: usize,
    /// Existing relations removed in favour of a smaller candidate.
    pub replacements: usize,
    /// Compositions performed.
    pub compositions: usize,
    /// Relation comparisons performed.
    pub comparisons: usize,
    /// Self-loop tests performed.
    pub loop_checks: usize,
    /// Summed entry count of every relation that went through a self-loop test.
    pub checked_size_sum: usize,
    /// Time spent composing relations.
    pub compose_time: Duration,
    /// Time spent comparing relations.
    pub compare_time: Duration,
    /// Time spent in self-loop tests.
    pub loop_check_time: Duration,
}

impl CheckStats {
    /// Average entry count of the relations that went through a self-loop
    /// test, or 0 if none did.
    pub fn avg_checked_size(&self) -> usize {
        if self.loop_checks == 0 {
            0
        } else {
            self.checked_size_sum / self.loop_checks
        }
    }
}

impl fmt::Display for CheckStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let w = 42;
        writeln!(f, "{: <w$}{}", "Initial closure size:", self.initial_size, w = w)?;
        writeln!(f, "{: <w$}{}", "Final closure size:", self.final_size, w = w)?;
        writeln!(f, "{: <w$}{}", "Rejections:", self.rejections, w = w)?;
        writeln!(f, "{: <w$}{}", "Replacements:", self.replacements, w = w)?;
        writeln!(f, "{: <w$}{}", "Sloped relations composed:", self.compositions, w = w)?;
        writeln!(f, "{: <w$}{:?}", "Time spent composing:", self.compose_time, w = w)?;
        writeln!(f, "{: <w$}{}", "Sloped relations compared:", self.comparisons, w = w)?;
        writeln!(f, "{: <w$}{:?}", "Time spent comparing:", self.compare_time, w = w)?;
        writeln!(f, "{: <w$}{}", "Self-loop checks:", self.loop_checks, w = w)?;
        writeln!(f, "{: <w$}{:?}", "Time spent loop-checking:", self.loop_check_time, w = w)?;
        if self.loop_checks > 0 {
            writeln!(
                f,
                "{: <w$}{}",
                "Average size of loop-checked relations:",
                self.avg_checked_size(),
                w = w
            )?;
        }
        Ok(())
    }
}
