//! Close interception for unsaved changes

/// Inputs to a close decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseRequestInput {
    pub is_dirty: bool,
    /// One-shot override set by a programmatic close follow-through
    pub force_close_once: bool,
}

/// Outcome of a close decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseRequestDecision {
    /// Whether the close must be intercepted
    pub should_block: bool,
    /// Next value of the one-shot override; always consumed
    pub next_force_close_once: bool,
}

/// Decide whether a close request should be intercepted.
///
/// A set override admits exactly one close regardless of dirty state and is
/// consumed in the same decision, so a programmatic close can bypass the
/// guard once without re-entrant blocking.
pub fn resolve_close_request(input: CloseRequestInput) -> CloseRequestDecision {
    if input.force_close_once {
        return CloseRequestDecision {
            should_block: false,
            next_force_close_once: false,
        };
    }

    CloseRequestDecision {
        should_block: input.is_dirty,
        next_force_close_once: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_close_when_dirty_without_override() {
        let decision = resolve_close_request(CloseRequestInput {
            is_dirty: true,
            force_close_once: false,
        });
        assert_eq!(
            decision,
            CloseRequestDecision {
                should_block: true,
                next_force_close_once: false,
            }
        );
    }

    #[test]
    fn allows_close_when_clean() {
        let decision = resolve_close_request(CloseRequestInput {
            is_dirty: false,
            force_close_once: false,
        });
        assert_eq!(
            decision,
            CloseRequestDecision {
                should_block: false,
                next_force_close_once: false,
            }
        );
    }

    #[test]
    fn override_admits_one_close_and_is_consumed() {
        let decision = resolve_close_request(CloseRequestInput {
            is_dirty: true,
            force_close_once: true,
        });
        assert_eq!(
            decision,
            CloseRequestDecision {
                should_block: false,
                next_force_close_once: false,
            }
        );
    }

    #[test]
    fn override_is_consumed_even_when_clean() {
        let decision = resolve_close_request(CloseRequestInput {
            is_dirty: false,
            force_close_once: true,
        });
        assert!(!decision.should_block);
        assert!(!decision.next_force_close_once);
    }
}
