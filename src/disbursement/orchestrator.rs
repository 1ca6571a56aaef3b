use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use rust_decimal::Decimal;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::models::{
    AuthorizationEvent, ChargeAttempt, ChargeOutcome, DisbursementReport, DisbursementStatus,
};
use super::split::{compute_shares, MemberShare, RemainderPolicy};
use crate::error::{AppError, AppResult, ChargeError};
use crate::group::{Group, MemberAccount};
use crate::processor::{ChargeProcessor, ChargeRequest};
use crate::ratio::MemberRatio;

/// Read-only lookups a disbursement run needs, plus the processed-event
/// marks. Row ordering is normalized by the orchestrator before splitting,
/// so implementations are free to return members in any order.
#[async_trait]
pub trait DisbursementDirectory: Send + Sync {
    async fn group_for_card(&self, card_reference: &str) -> AppResult<Option<Group>>;
    async fn member_accounts(&self, group_id: Uuid) -> AppResult<Vec<MemberAccount>>;
    async fn ratios_for_group(&self, group_id: Uuid) -> AppResult<Vec<MemberRatio>>;
    async fn was_event_processed(&self, event_id: &str) -> AppResult<bool>;
    async fn mark_event_processed(&self, event_id: &str) -> AppResult<()>;
}

/// Drives one card-spend event through resolution, splitting and per-member
/// charging, to a terminal status.
///
/// The orchestrator never mutates group membership or ratios; the only
/// state it writes is the processed-event mark. Failed charges are
/// reported, not retried.
pub struct DisbursementOrchestrator {
    directory: Arc<dyn DisbursementDirectory>,
    processor: Arc<dyn ChargeProcessor>,
    remainder_policy: RemainderPolicy,
    charge_timeout: Duration,
}

impl DisbursementOrchestrator {
    pub fn new(
        directory: Arc<dyn DisbursementDirectory>,
        processor: Arc<dyn ChargeProcessor>,
        remainder_policy: RemainderPolicy,
        charge_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            processor,
            remainder_policy,
            charge_timeout,
        }
    }

    /// Process one verified event to a terminal state. The caller has
    /// already authenticated the payload; from here the run cannot be
    /// cancelled mid-flight.
    pub async fn process_event(&self, event: AuthorizationEvent) -> AppResult<DisbursementReport> {
        info!(
            "⚙️ Processing card spend event {} ({} {} on card {})",
            event.event_id, event.amount, event.currency, event.card_reference
        );

        if self.directory.was_event_processed(&event.event_id).await? {
            warn!(
                "Duplicate event {}, acknowledging without re-charging",
                event.event_id
            );
            return Ok(DisbursementReport {
                event_id: event.event_id,
                status: DisbursementStatus::AlreadyProcessed,
                attempts: Vec::new(),
            });
        }

        let group = self
            .directory
            .group_for_card(&event.card_reference)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No group mapped to card {}",
                    event.card_reference
                ))
            })?;

        let accounts = self.directory.member_accounts(group.id).await?;
        if accounts.iter().all(|a| a.instrument_reference.is_none()) {
            return Err(AppError::Validation(
                "No group member has a payment instrument on file".to_string(),
            ));
        }
        let instruments: HashMap<Uuid, String> = accounts
            .into_iter()
            .filter_map(|a| Some((a.user_id, a.instrument_reference?)))
            .collect();

        let ratios = self.directory.ratios_for_group(group.id).await?;
        let mut ordered: Vec<(Uuid, Decimal)> =
            ratios.into_iter().map(|r| (r.user_id, r.percentage)).collect();
        // Fixed iteration order regardless of what the directory returned
        ordered.sort_by_key(|(user_id, _)| *user_id);

        info!(
            "Event {} resolved to group {} with {} payers, splitting",
            event.event_id,
            group.id,
            ordered.len()
        );

        // The full split, remainder included, is fixed before any charge
        // goes out
        let shares = compute_shares(event.amount, &ordered, self.remainder_policy);

        let attempts = join_all(
            shares
                .iter()
                .map(|share| self.attempt_charge(&event, share, instruments.get(&share.user_id))),
        )
        .await;

        let succeeded = attempts.iter().filter(|a| a.succeeded()).count();
        let failed = attempts.len() - succeeded;
        let status = if failed == 0 {
            DisbursementStatus::Completed
        } else if succeeded > 0 {
            DisbursementStatus::PartiallyFailed
        } else {
            DisbursementStatus::Failed
        };

        // The event is acknowledged in every terminal state: retrying the
        // whole event would re-charge members that already paid
        self.directory.mark_event_processed(&event.event_id).await?;

        match status {
            DisbursementStatus::Completed => info!(
                "✓ Disbursement completed for event {}: {} members charged",
                event.event_id, succeeded
            ),
            _ => warn!(
                "Disbursement for event {} finished {:?}: {} succeeded, {} failed",
                event.event_id, status, succeeded, failed
            ),
        }

        Ok(DisbursementReport {
            event_id: event.event_id,
            status,
            attempts,
        })
    }

    /// One member's charge. Failures are recorded, never propagated: one
    /// member's outcome has no effect on the others.
    async fn attempt_charge(
        &self,
        event: &AuthorizationEvent,
        share: &MemberShare,
        instrument: Option<&String>,
    ) -> ChargeAttempt {
        let Some(instrument) = instrument else {
            warn!("Member {} has no payment instrument on file", share.user_id);
            return ChargeAttempt {
                member_id: share.user_id,
                amount: share.amount,
                outcome: ChargeOutcome::Failed {
                    reason: ChargeError::NoInstrument.to_string(),
                },
            };
        };

        let request = ChargeRequest {
            amount: share.amount,
            currency: event.currency.clone(),
            instrument_reference: instrument.clone(),
            idempotency_key: format!("{}:{}", event.event_id, share.user_id),
            event_id: event.event_id.clone(),
            member_id: share.user_id,
        };

        let outcome = match timeout(self.charge_timeout, self.processor.charge(&request)).await {
            Ok(Ok(())) => ChargeOutcome::Succeeded,
            Ok(Err(err)) => {
                error!("Charge failed for member {}: {}", share.user_id, err);
                ChargeOutcome::Failed {
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                let err = ChargeError::Timeout(self.charge_timeout.as_secs());
                error!("Charge timed out for member {}: {}", share.user_id, err);
                ChargeOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        ChargeAttempt {
            member_id: share.user_id,
            amount: share.amount,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeDirectory {
        group: Group,
        card_reference: String,
        accounts: Vec<MemberAccount>,
        ratios: Vec<MemberRatio>,
        processed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DisbursementDirectory for FakeDirectory {
        async fn group_for_card(&self, card_reference: &str) -> AppResult<Option<Group>> {
            Ok((card_reference == self.card_reference).then(|| self.group.clone()))
        }

        async fn member_accounts(&self, _group_id: Uuid) -> AppResult<Vec<MemberAccount>> {
            Ok(self.accounts.clone())
        }

        async fn ratios_for_group(&self, _group_id: Uuid) -> AppResult<Vec<MemberRatio>> {
            Ok(self.ratios.clone())
        }

        async fn was_event_processed(&self, event_id: &str) -> AppResult<bool> {
            Ok(self.processed.lock().unwrap().iter().any(|e| e == event_id))
        }

        async fn mark_event_processed(&self, event_id: &str) -> AppResult<()> {
            self.processed.lock().unwrap().push(event_id.to_string());
            Ok(())
        }
    }

    struct FakeProcessor {
        fail_members: HashSet<Uuid>,
        requests: Mutex<Vec<ChargeRequest>>,
    }

    impl FakeProcessor {
        fn new(fail_members: impl IntoIterator<Item = Uuid>) -> Self {
            Self {
                fail_members: fail_members.into_iter().collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChargeProcessor for FakeProcessor {
        async fn charge(&self, request: &ChargeRequest) -> Result<(), ChargeError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_members.contains(&request.member_id) {
                Err(ChargeError::ProcessorCall("card_declined".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn member(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn fixture(accounts: Vec<MemberAccount>, ratios: Vec<(Uuid, Decimal)>) -> FakeDirectory {
        let group = Group {
            id: Uuid::from_u128(42),
            name: "flat 7".to_string(),
            admin_id: member(1),
        };
        let ratios = ratios
            .into_iter()
            .map(|(user_id, percentage)| MemberRatio {
                group_id: group.id,
                user_id,
                percentage,
            })
            .collect();
        FakeDirectory {
            group,
            card_reference: "ic_shared".to_string(),
            accounts,
            ratios,
            processed: Mutex::new(Vec::new()),
        }
    }

    fn account(n: u128, instrument: Option<&str>) -> MemberAccount {
        MemberAccount {
            user_id: member(n),
            instrument_reference: instrument.map(str::to_string),
        }
    }

    fn event(amount: i64) -> AuthorizationEvent {
        AuthorizationEvent {
            event_id: "evt_1".to_string(),
            card_reference: "ic_shared".to_string(),
            amount,
            currency: "eur".to_string(),
        }
    }

    fn orchestrator(
        directory: Arc<FakeDirectory>,
        processor: Arc<FakeProcessor>,
    ) -> DisbursementOrchestrator {
        DisbursementOrchestrator::new(
            directory,
            processor,
            RemainderPolicy::Last,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn completed_run_charges_every_member_exactly() {
        let directory = Arc::new(fixture(
            vec![
                account(1, Some("pi_a")),
                account(2, Some("pi_b")),
                account(3, Some("pi_c")),
            ],
            vec![
                (member(1), dec!(50)),
                (member(2), dec!(30)),
                (member(3), dec!(20)),
            ],
        ));
        let processor = Arc::new(FakeProcessor::new([]));

        let report = orchestrator(directory.clone(), processor.clone())
            .process_event(event(100))
            .await
            .unwrap();

        assert_eq!(report.status, DisbursementStatus::Completed);
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(
            report.attempts.iter().map(|a| a.amount).sum::<i64>(),
            100
        );

        let requests = processor.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        let keys: HashSet<&str> = requests.iter().map(|r| r.idempotency_key.as_str()).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains("evt_1:00000000-0000-0000-0000-000000000002"));
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_others() {
        let directory = Arc::new(fixture(
            vec![
                account(1, Some("pi_a")),
                account(2, Some("pi_b")),
                account(3, Some("pi_c")),
            ],
            vec![
                (member(1), dec!(50)),
                (member(2), dec!(30)),
                (member(3), dec!(20)),
            ],
        ));
        let processor = Arc::new(FakeProcessor::new([member(2)]));

        let report = orchestrator(directory.clone(), processor.clone())
            .process_event(event(100))
            .await
            .unwrap();

        assert_eq!(report.status, DisbursementStatus::PartiallyFailed);
        assert_eq!(report.charged_member_count(), 2);

        let by_member: HashMap<Uuid, &ChargeAttempt> =
            report.attempts.iter().map(|a| (a.member_id, a)).collect();
        assert!(by_member[&member(1)].succeeded());
        assert!(matches!(
            &by_member[&member(2)].outcome,
            ChargeOutcome::Failed { reason } if reason.contains("card_declined")
        ));
        assert!(by_member[&member(3)].succeeded());

        // All three were attempted, and the event is acknowledged once
        assert_eq!(processor.requests.lock().unwrap().len(), 3);
        assert_eq!(directory.processed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_failures_report_failed_but_still_acknowledge() {
        let directory = Arc::new(fixture(
            vec![account(1, Some("pi_a")), account(2, Some("pi_b"))],
            vec![(member(1), dec!(50)), (member(2), dec!(50))],
        ));
        let processor = Arc::new(FakeProcessor::new([member(1), member(2)]));

        let report = orchestrator(directory.clone(), processor)
            .process_event(event(100))
            .await
            .unwrap();

        assert_eq!(report.status, DisbursementStatus::Failed);
        assert_eq!(report.charged_member_count(), 0);
        assert_eq!(directory.processed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_event_is_acknowledged_without_charges() {
        let directory = Arc::new(fixture(
            vec![account(1, Some("pi_a"))],
            vec![(member(1), dec!(100))],
        ));
        directory.processed.lock().unwrap().push("evt_1".to_string());
        let processor = Arc::new(FakeProcessor::new([]));

        let report = orchestrator(directory, processor.clone())
            .process_event(event(100))
            .await
            .unwrap();

        assert_eq!(report.status, DisbursementStatus::AlreadyProcessed);
        assert!(report.attempts.is_empty());
        assert!(processor.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unmapped_card_is_rejected_before_any_charge() {
        let directory = Arc::new(fixture(
            vec![account(1, Some("pi_a"))],
            vec![(member(1), dec!(100))],
        ));
        let processor = Arc::new(FakeProcessor::new([]));

        let mut unknown = event(100);
        unknown.card_reference = "ic_unknown".to_string();
        let result = orchestrator(directory, processor.clone())
            .process_event(unknown)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(processor.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_eligible_payer_is_rejected_before_any_charge() {
        let directory = Arc::new(fixture(
            vec![account(1, None), account(2, None)],
            vec![(member(1), dec!(50)), (member(2), dec!(50))],
        ));
        let processor = Arc::new(FakeProcessor::new([]));

        let result = orchestrator(directory.clone(), processor.clone())
            .process_event(event(100))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(processor.requests.lock().unwrap().is_empty());
        assert!(directory.processed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn member_without_instrument_fails_alone() {
        let directory = Arc::new(fixture(
            vec![
                account(1, Some("pi_a")),
                account(2, None),
                account(3, Some("pi_c")),
            ],
            vec![
                (member(1), dec!(50)),
                (member(2), dec!(30)),
                (member(3), dec!(20)),
            ],
        ));
        let processor = Arc::new(FakeProcessor::new([]));

        let report = orchestrator(directory, processor.clone())
            .process_event(event(100))
            .await
            .unwrap();

        assert_eq!(report.status, DisbursementStatus::PartiallyFailed);
        let by_member: HashMap<Uuid, &ChargeAttempt> =
            report.attempts.iter().map(|a| (a.member_id, a)).collect();
        assert!(matches!(
            &by_member[&member(2)].outcome,
            ChargeOutcome::Failed { reason } if reason.contains("instrument")
        ));
        // No processor call went out for the member without an instrument
        assert_eq!(processor.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn remainder_lands_on_the_last_member_in_id_order() {
        let directory = Arc::new(fixture(
            vec![
                account(1, Some("pi_a")),
                account(2, Some("pi_b")),
                account(3, Some("pi_c")),
            ],
            vec![
                // Deliberately out of order: the orchestrator must sort
                (member(3), dec!(33.4)),
                (member(1), dec!(33.3)),
                (member(2), dec!(33.3)),
            ],
        ));
        let processor = Arc::new(FakeProcessor::new([]));

        let report = orchestrator(directory, processor)
            .process_event(event(10))
            .await
            .unwrap();

        let by_member: HashMap<Uuid, i64> = report
            .attempts
            .iter()
            .map(|a| (a.member_id, a.amount))
            .collect();
        assert_eq!(by_member[&member(1)], 3);
        assert_eq!(by_member[&member(2)], 3);
        assert_eq!(by_member[&member(3)], 4);
    }
}
