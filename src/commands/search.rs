use crate::error::{Result, RunnerError};
use crate::services::match_engine::Candidate;
use crate::services::runner::Runner;

/// Matches `query` and keeps at most `limit` candidates, in emission order.
pub fn search(runner: &Runner, query: &str, limit: Option<usize>) -> Vec<Candidate> {
    let mut results = runner.match_query(query);
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    results
}

/// Runs the candidate at `position` (one based, as printed) of a result list.
pub fn open_result(runner: &Runner, results: &[Candidate], position: usize) -> Result<()> {
    let candidate = position
        .checked_sub(1)
        .and_then(|index| results.get(index))
        .ok_or(RunnerError::NoSuchResult {
            index: position,
            count: results.len(),
        })?;
    runner.run(candidate)
}
