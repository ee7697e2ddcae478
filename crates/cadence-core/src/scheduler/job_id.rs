//! Composite job ids for `(task_id, workflow_id)` pairs.
//!
//! Layout: `{task_len}:{task_id}:{workflow_id}`, where `task_len` is the byte
//! length of `task_id` in decimal. The prefix makes the split unambiguous for
//! any task or workflow id, including ids that contain `:` themselves.

use cadence_types::error::JobIdError;

/// Encode a task id and workflow id into a single engine job id.
pub fn encode(task_id: &str, workflow_id: &str) -> String {
    format!("{}:{task_id}:{workflow_id}", task_id.len())
}

/// Split an engine job id back into `(task_id, workflow_id)`.
pub fn decode(job_id: &str) -> Result<(String, String), JobIdError> {
    let (prefix, rest) = job_id
        .split_once(':')
        .ok_or_else(|| JobIdError::MissingPrefix(job_id.to_string()))?;

    let well_formed_prefix = !prefix.is_empty()
        && prefix.bytes().all(|b| b.is_ascii_digit())
        && (prefix == "0" || !prefix.starts_with('0'));
    if !well_formed_prefix {
        return Err(JobIdError::MissingPrefix(job_id.to_string()));
    }

    let declared: usize = prefix
        .parse()
        .map_err(|_| JobIdError::MissingPrefix(job_id.to_string()))?;
    let malformed = || JobIdError::Malformed {
        job_id: job_id.to_string(),
        declared,
    };

    let task_id = rest.get(..declared).ok_or_else(malformed)?;
    let workflow_id = rest
        .get(declared..)
        .and_then(|tail| tail.strip_prefix(':'))
        .ok_or_else(malformed)?;

    Ok((task_id.to_string(), workflow_id.to_string()))
}
