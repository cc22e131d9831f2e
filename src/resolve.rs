//! Two-variant resolution results.
//!
//! Every resolver in this crate treats "not found" as a normal outcome,
//! structurally distinct from an error: the reason travels with the miss
//! and the call site decides whether the absence is fatal.

/// Outcome of a resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The resolver produced a value
    Resolved(T),
    /// Nothing matched; carries a human-readable reason
    Unresolved(String),
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_carries_value() {
        let r = Resolution::Resolved(7);
        assert!(r.is_resolved());
        assert_eq!(r.into_option(), Some(7));
    }

    #[test]
    fn unresolved_carries_reason_not_value() {
        let r: Resolution<i32> = Resolution::Unresolved("no match".into());
        assert!(!r.is_resolved());
        assert_eq!(r.into_option(), None);
    }
}
