use thiserror::Error;

/// Errors that abort a whole engine run.
///
/// Almost everything that goes wrong during reconciliation is captured
/// per connection in the report instead; only the inability to read the
/// baseline snapshot is fatal, because without observed state there is
/// nothing safe to plan against.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot read lab baseline: {source}")]
    BaselineUnavailable {
        #[source]
        source: labmend_api::Error,
    },
}
