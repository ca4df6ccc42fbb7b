use thiserror::Error;

/// Fatal conditions a check or a builder call can run into. An unsound
/// verdict is *not* an error: the check functions return `Ok(false)` for it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    /// An illegal flag combination, an external index outside the declared
    /// capacity, or a composition of relations with mismatched dimensions.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A stay/decrease declaration referenced a height the edge relation
    /// cannot hold. Heights must be declared before the edge they are used
    /// on is first created.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),
}

impl CheckError {
    pub(crate) fn dimension_mismatch(left: (usize, usize), right: (usize, usize)) -> Self {
        CheckError::InvariantViolation(format!(
            "cannot compose a {}x{} relation with a {}x{} relation",
            left.0, left.1, right.0, right.1
        ))
    }
}
