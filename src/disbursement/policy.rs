use tracing::info;

/// Policy gate for authorization-request events.
///
/// This answers the pre-authorization question only: it never splits or
/// charges, and stays decoupled from the disbursement state machine.
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    ceiling_minor_units: i64,
}

impl ApprovalPolicy {
    pub fn new(ceiling_minor_units: i64) -> Self {
        Self {
            ceiling_minor_units,
        }
    }

    /// Approve a pending amount iff it does not exceed the configured ceiling
    pub fn approve(&self, pending_amount: i64) -> bool {
        let approved = pending_amount <= self.ceiling_minor_units;
        info!(
            "Authorization request for {} against ceiling {}: approved={}",
            pending_amount, self.ceiling_minor_units, approved
        );
        approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approves_up_to_and_including_the_ceiling() {
        let policy = ApprovalPolicy::new(50_000);

        assert!(policy.approve(0));
        assert!(policy.approve(49_999));
        assert!(policy.approve(50_000));
        assert!(!policy.approve(50_001));
    }
}
