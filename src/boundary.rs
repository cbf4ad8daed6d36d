use std::fmt;

/// Warnings raised when a collaborator cannot answer and goops carries on anyway.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// A tag query failed and was treated as "no tag"
    TagLookupFailed { query: String, reason: String },
    /// No release tag is reachable from HEAD
    NoPreviousTag { assumed: String },
    /// The issue tracker rejected a version assignment for one issue
    IssueUpdateFailed { issue: String, reason: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::TagLookupFailed { query, reason } => {
                write!(f, "Could not read {} ({}), assuming none", query, reason.trim())
            }
            BoundaryWarning::NoPreviousTag { assumed } => {
                write!(f, "No previous tag found, starting from {}", assumed)
            }
            BoundaryWarning::IssueUpdateFailed { issue, reason } => {
                write!(f, "Could not update issue '{}': {}", issue, reason)
            }
        }
    }
}
