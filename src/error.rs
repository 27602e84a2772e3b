use thiserror::Error;

/// Result type used throughout the paging core.
pub type VmResult<T> = Result<T, VmError>;

/// Errors surfaced by address translation and fault handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The swap store has no slots left. Fatal to the simulated run.
    #[error("swap store exhausted: all {capacity} slots are allocated")]
    ResourceExhausted { capacity: usize },

    /// Internal bookkeeping disagrees with itself; indicates a caller or
    /// implementation bug, not a condition a program can trigger.
    #[error("paging invariant violated: {detail}")]
    InvariantViolation { detail: String },

    /// A virtual address mapped to a page index beyond the configured table.
    #[error("virtual page {page} is out of range (table holds {pages} pages)")]
    OutOfRange { page: usize, pages: usize },
}

impl VmError {
    /// Shorthand for an `InvariantViolation` with a formatted detail message.
    pub fn invariant(detail: impl Into<String>) -> Self {
        VmError::InvariantViolation {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = VmError::ResourceExhausted { capacity: 128 };
        assert_eq!(
            err.to_string(),
            "swap store exhausted: all 128 slots are allocated"
        );

        let err = VmError::OutOfRange {
            page: 4096,
            pages: 2048,
        };
        assert_eq!(
            err.to_string(),
            "virtual page 4096 is out of range (table holds 2048 pages)"
        );
    }

    #[test]
    fn test_invariant_helper() {
        let err = VmError::invariant("fault requested for resident page 3");
        assert_eq!(
            err,
            VmError::InvariantViolation {
                detail: "fault requested for resident page 3".to_string()
            }
        );
        assert!(err.to_string().contains("resident page 3"));
    }
}
