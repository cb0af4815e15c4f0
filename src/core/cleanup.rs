//! Plan subscription cleanup.
//!
//! Walks the app's own plan subscriptions and moves each one along its
//! lifecycle:
//!
//! 1. Expiring within `first_warning_days`: first warning (once)
//! 2. Expiring within `final_warning_days`: final warning (once)
//! 3. Expired: account blocked
//! 4. Blocked for longer than `deletion_grace_days`: budgets, their records
//!    and clients are deleted and the subscription is marked `DELETED`
//!
//! Every step notifies the subscriber. A failed notification is logged and
//! does not undo or block the state change.

use crate::{
    config::CleanupSettings,
    entities::{
        Bill, Budget, Client, Expense, Income, PlanStatus, PlanSubscription, Saving, User, bill,
        budget, client, expense, income, plan_subscription, saving,
    },
    errors::Result,
    notify::{Notification, Notifier, Recipient},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

/// Counts of subscriptions moved along their lifecycle by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// First expiry warnings sent
    pub warnings30: usize,
    /// Final expiry warnings sent
    pub warnings7: usize,
    /// Subscriptions blocked on expiry
    pub blocked: usize,
    /// Accounts whose data was purged
    pub deleted: usize,
}

/// What a single active subscription needs right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    FirstWarning,
    FinalWarning,
    Block,
}

fn next_action(
    subscription: &plan_subscription::Model,
    now: DateTime<Utc>,
    settings: &CleanupSettings,
) -> Action {
    if subscription.expires_at <= now {
        return Action::Block;
    }
    let days_left = (subscription.expires_at - now).num_days();
    if days_left <= settings.final_warning_days && subscription.warned_7_at.is_none() {
        Action::FinalWarning
    } else if days_left <= settings.first_warning_days
        && subscription.warned_30_at.is_none()
        && subscription.warned_7_at.is_none()
    {
        Action::FirstWarning
    } else {
        Action::None
    }
}

/// Runs one cleanup pass.
#[instrument(skip(db, notifier, settings))]
pub async fn run_cleanup(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
    settings: &CleanupSettings,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    let active = PlanSubscription::find()
        .filter(plan_subscription::Column::Status.eq(PlanStatus::Active.as_str()))
        .order_by_asc(plan_subscription::Column::Id)
        .all(db)
        .await?;

    for subscription in active {
        let id = subscription.id;
        if let Err(err) = advance_active(db, notifier, subscription, now, settings, &mut report).await {
            error!("Cleanup failed for plan subscription {}: {}", id, err);
        }
    }

    let grace_cutoff = now - Duration::days(settings.deletion_grace_days);
    let expired_grace = PlanSubscription::find()
        .filter(plan_subscription::Column::Status.eq(PlanStatus::Blocked.as_str()))
        .filter(plan_subscription::Column::BlockedAt.lte(grace_cutoff))
        .order_by_asc(plan_subscription::Column::Id)
        .all(db)
        .await?;

    for subscription in expired_grace {
        let id = subscription.id;
        let user_id = subscription.user_id.clone();
        match purge_user_data(db, subscription).await {
            Ok(()) => {
                report.deleted += 1;
                send(db, notifier, &user_id, &Notification::DataDeleted).await;
            }
            Err(err) => error!("Failed to purge data for plan subscription {}: {}", id, err),
        }
    }

    info!(
        "Cleanup sent {} first and {} final warning(s), blocked {}, deleted {}",
        report.warnings30, report.warnings7, report.blocked, report.deleted
    );

    Ok(report)
}

async fn advance_active(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    subscription: plan_subscription::Model,
    now: DateTime<Utc>,
    settings: &CleanupSettings,
    report: &mut CleanupReport,
) -> Result<()> {
    let user_id = subscription.user_id.clone();
    let expires_at = subscription.expires_at;
    let days_left = (expires_at - now).num_days();

    match next_action(&subscription, now, settings) {
        Action::None => {}
        Action::FirstWarning => {
            let mut active_model: plan_subscription::ActiveModel = subscription.into();
            active_model.warned_30_at = Set(Some(now));
            active_model.update(db).await?;
            report.warnings30 += 1;
            send(db, notifier, &user_id, &Notification::ExpiryWarning { days_left, expires_at }).await;
        }
        Action::FinalWarning => {
            let mut active_model: plan_subscription::ActiveModel = subscription.into();
            active_model.warned_7_at = Set(Some(now));
            active_model.update(db).await?;
            report.warnings7 += 1;
            send(db, notifier, &user_id, &Notification::ExpiryWarning { days_left, expires_at }).await;
        }
        Action::Block => {
            let mut active_model: plan_subscription::ActiveModel = subscription.into();
            active_model.status = Set(PlanStatus::Blocked.as_str().to_string());
            active_model.blocked_at = Set(Some(now));
            active_model.update(db).await?;
            report.blocked += 1;
            send(db, notifier, &user_id, &Notification::Blocked { expired_at: expires_at }).await;
        }
    }

    Ok(())
}

/// Deletes every budget (with its records) and client of the subscriber and
/// marks the subscription `DELETED`, all in one transaction.
async fn purge_user_data(db: &DatabaseConnection, subscription: plan_subscription::Model) -> Result<()> {
    let txn = db.begin().await?;
    let user_id = subscription.user_id.clone();

    let budget_ids: Vec<i64> = Budget::find()
        .filter(budget::Column::UserId.eq(user_id.as_str()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    let client_ids: Vec<i64> = Client::find()
        .filter(client::Column::UserId.eq(user_id.as_str()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    Income::delete_many()
        .filter(
            income::Column::BudgetId
                .is_in(budget_ids.clone())
                .or(income::Column::ClientId.is_in(client_ids.clone())),
        )
        .exec(&txn)
        .await?;
    Expense::delete_many()
        .filter(expense::Column::BudgetId.is_in(budget_ids.clone()))
        .exec(&txn)
        .await?;
    Bill::delete_many()
        .filter(bill::Column::BudgetId.is_in(budget_ids.clone()))
        .exec(&txn)
        .await?;
    Saving::delete_many()
        .filter(saving::Column::BudgetId.is_in(budget_ids.clone()))
        .exec(&txn)
        .await?;
    let budgets = Budget::delete_many()
        .filter(budget::Column::Id.is_in(budget_ids))
        .exec(&txn)
        .await?;
    Client::delete_many()
        .filter(client::Column::Id.is_in(client_ids))
        .exec(&txn)
        .await?;

    let mut active_model: plan_subscription::ActiveModel = subscription.into();
    active_model.status = Set(PlanStatus::Deleted.as_str().to_string());
    active_model.update(&txn).await?;

    txn.commit().await?;

    info!("Purged {} budget(s) for user {}", budgets.rows_affected, user_id);
    Ok(())
}

/// Looks up the recipient and hands the notification to the notifier.
async fn send(db: &DatabaseConnection, notifier: &dyn Notifier, user_id: &str, notification: &Notification) {
    let user = match User::find_by_id(user_id.to_string()).one(db).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("No user record for {}, skipping notification", user_id);
            return;
        }
        Err(err) => {
            warn!("Could not load user {} for notification: {}", user_id, err);
            return;
        }
    };

    let recipient = Recipient {
        user_id: user.id,
        email: user.email,
    };
    if let Err(err) = notifier.notify(&recipient, notification).await {
        warn!(
            "Notification {:?} to {} failed: {}",
            notification.subject(),
            recipient.email,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BudgetType, IncomeStatus};
    use crate::notify::testing::RecordingNotifier;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_first_and_final_warnings_are_sent_once() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        let settings = CleanupSettings::default();
        create_test_user(&db, "user_1").await?;
        create_test_user(&db, "user_2").await?;
        let now = at(2025, 6, 1, 12);

        create_plan_subscription(&db, "user_1", PlanStatus::Active, now + Duration::days(20), None).await?;
        create_plan_subscription(&db, "user_2", PlanStatus::Active, now + Duration::days(3), None).await?;

        let report = run_cleanup(&db, &notifier, now, &settings).await?;
        assert_eq!(
            report,
            CleanupReport {
                warnings30: 1,
                warnings7: 1,
                blocked: 0,
                deleted: 0
            }
        );

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "user_1");
        assert!(matches!(sent[0].1, Notification::ExpiryWarning { days_left: 20, .. }));
        assert!(matches!(sent[1].1, Notification::ExpiryWarning { days_left: 3, .. }));

        // Same instant again: nothing new
        let again = run_cleanup(&db, &notifier, now, &settings).await?;
        assert_eq!(again, CleanupReport::default());

        Ok(())
    }

    #[tokio::test]
    async fn test_expired_subscription_is_blocked() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        create_test_user(&db, "user_1").await?;
        let now = at(2025, 6, 1, 12);
        let subscription =
            create_plan_subscription(&db, "user_1", PlanStatus::Active, now - Duration::hours(1), None).await?;

        let report = run_cleanup(&db, &notifier, now, &CleanupSettings::default()).await?;
        assert_eq!(report.blocked, 1);

        let reloaded = PlanSubscription::find_by_id(subscription.id).one(&db).await?;
        let reloaded = reloaded.ok_or(crate::errors::Error::Validation {
            reason: "subscription vanished".to_string(),
        })?;
        assert_eq!(reloaded.status, "BLOCKED");
        assert_eq!(reloaded.blocked_at, Some(now));
        assert!(matches!(notifier.sent()[0].1, Notification::Blocked { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_blocked_past_grace_is_purged() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        create_test_user(&db, "user_1").await?;
        let now = at(2025, 9, 1, 0);

        // Data that should go
        let client = create_test_client(&db, "Acme").await?;
        let budget = create_test_budget(&db, "user_1", 8, 2025, BudgetType::Business).await?;
        create_test_income(&db, budget.id, Some(client.id), at(2025, 8, 1, 0), "Subscription: Acme", IncomeStatus::Paid, None).await?;
        create_linked_record(&db, crate::core::budget_guard::RecordKind::Expense, budget.id, None).await?;

        // Another user's data that must stay
        let kept = create_test_budget(&db, "user_2", 8, 2025, BudgetType::Personal).await?;

        let subscription = create_plan_subscription(
            &db,
            "user_1",
            PlanStatus::Blocked,
            now - Duration::days(40),
            Some(now - Duration::days(31)),
        )
        .await?;

        let report = run_cleanup(&db, &notifier, now, &CleanupSettings::default()).await?;
        assert_eq!(report.deleted, 1);

        assert_eq!(Income::find().count(&db).await?, 0);
        assert_eq!(Expense::find().count(&db).await?, 0);
        assert_eq!(Client::find().count(&db).await?, 0);
        let remaining: Vec<i64> = Budget::find().all(&db).await?.into_iter().map(|b| b.id).collect();
        assert_eq!(remaining, vec![kept.id]);

        let reloaded = PlanSubscription::find_by_id(subscription.id).one(&db).await?;
        assert_eq!(reloaded.map(|s| s.status), Some("DELETED".to_string()));
        assert_eq!(notifier.sent()[0].1, Notification::DataDeleted);

        Ok(())
    }

    #[tokio::test]
    async fn test_blocked_within_grace_is_kept() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        let now = at(2025, 9, 1, 0);
        create_test_budget(&db, "user_1", 8, 2025, BudgetType::Personal).await?;
        create_plan_subscription(
            &db,
            "user_1",
            PlanStatus::Blocked,
            now - Duration::days(12),
            Some(now - Duration::days(10)),
        )
        .await?;

        let report = run_cleanup(&db, &notifier, now, &CleanupSettings::default()).await?;
        assert_eq!(report.deleted, 0);
        assert_eq!(Budget::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_stop_the_job() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::failing();
        create_test_user(&db, "user_1").await?;
        create_test_user(&db, "user_2").await?;
        let now = at(2025, 6, 1, 12);
        create_plan_subscription(&db, "user_1", PlanStatus::Active, now - Duration::days(1), None).await?;
        create_plan_subscription(&db, "user_2", PlanStatus::Active, now - Duration::days(2), None).await?;

        let report = run_cleanup(&db, &notifier, now, &CleanupSettings::default()).await?;
        assert_eq!(report.blocked, 2);
        assert_eq!(notifier.sent().len(), 2);

        Ok(())
    }

    #[test]
    fn test_next_action_windows() {
        let settings = CleanupSettings::default();
        let now = at(2025, 1, 1, 0);
        let mut subscription = plan_subscription::Model {
            id: 1,
            user_id: "user_1".to_string(),
            status: "ACTIVE".to_string(),
            expires_at: now + Duration::days(45),
            warned_30_at: None,
            warned_7_at: None,
            blocked_at: None,
        };
        assert_eq!(next_action(&subscription, now, &settings), Action::None);

        subscription.expires_at = now + Duration::days(29);
        assert_eq!(next_action(&subscription, now, &settings), Action::FirstWarning);

        subscription.warned_30_at = Some(now);
        assert_eq!(next_action(&subscription, now, &settings), Action::None);

        subscription.expires_at = now + Duration::days(6);
        assert_eq!(next_action(&subscription, now, &settings), Action::FinalWarning);

        subscription.expires_at = now;
        assert_eq!(next_action(&subscription, now, &settings), Action::Block);
    }
}
