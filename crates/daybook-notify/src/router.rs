// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing of notification taps and actions.
//!
//! [`NotificationActionRouter`] is the boundary between the OS callback and
//! the rest of the system. It never returns an error: every failure is logged
//! and reported as a [`RouteOutcome`].
//!
//! Interactions that arrive while the device is locked are parked in the
//! deferred slot. [`NotificationActionRouter::process_pending_tap_if_unlocked`]
//! replays them after unlock, re-validating staleness, module policy, entity
//! existence, notification liveness, and the replay ledger before dispatch.

use std::sync::Arc;

use chrono::Duration;
use daybook_config::model::{LockQueryFailure, NotificationsConfig};
use daybook_core::{
    Clock, InteractionPresenter, LockStateOracle, ModuleAdapterHub, ModulePolicy,
    NotificationPayload, NotificationScheduler, seconds,
};
use tracing::{debug, error, warn};

use crate::alarms::AlarmLedger;
use crate::deferred::{DeferredInteraction, DeferredInteractionStore};
use crate::replay::ReplayDetector;
use crate::repos::EntityRepositories;
use crate::snooze::{SnoozeStatePersister, parse_snooze_action};
use crate::trace::{self, Stage};

/// Why an interaction was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    PolicyDisabled,
    EntityDeleted,
    DeferredStale,
    NotificationInactive,
    ReplayDetected,
    /// No handler claimed the payload or action.
    Unhandled,
}

/// Why an interaction was discarded before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    MissingPayload,
    MalformedPayload,
    /// The device was locked and the deferred slot could not be written.
    StorageFailure,
}

/// Which handler an interaction reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Dispatch {
    /// Task/habit snooze with history.
    Snooze,
    HubSnooze,
    HubAction,
    HubTap,
    /// Task/habit tap handed to the presenter.
    Presented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Dropped(DropReason),
    /// Stored in the deferred slot because the device is locked.
    Deferred,
    /// Nothing was waiting in the deferred slot.
    Idle,
    /// A deferred interaction was put back because the device is still locked.
    Redeferred,
    Skipped(SkipReason),
    Dispatched(Dispatch),
    /// A collaborator failed while handling the interaction; details are logged.
    Failed,
}

/// Router tunables taken from `[notifications]`.
#[derive(Debug, Clone, Copy)]
pub struct RouterSettings {
    pub max_deferred_age: Duration,
    pub lock_query_failure: LockQueryFailure,
}

impl RouterSettings {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            max_deferred_age: seconds(config.max_deferred_age_secs),
            lock_query_failure: config.lock_query_failure,
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&NotificationsConfig::default())
    }
}

pub struct NotificationActionRouter {
    oracle: Arc<dyn LockStateOracle>,
    deferred: DeferredInteractionStore,
    replay: ReplayDetector,
    policy: Arc<dyn ModulePolicy>,
    repos: EntityRepositories,
    scheduler: Arc<dyn NotificationScheduler>,
    alarms: AlarmLedger,
    hub: Arc<dyn ModuleAdapterHub>,
    snooze: Arc<SnoozeStatePersister>,
    presenter: Arc<dyn InteractionPresenter>,
    clock: Arc<dyn Clock>,
    settings: RouterSettings,
}

impl NotificationActionRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        oracle: Arc<dyn LockStateOracle>,
        deferred: DeferredInteractionStore,
        replay: ReplayDetector,
        policy: Arc<dyn ModulePolicy>,
        repos: EntityRepositories,
        scheduler: Arc<dyn NotificationScheduler>,
        alarms: AlarmLedger,
        hub: Arc<dyn ModuleAdapterHub>,
        snooze: Arc<SnoozeStatePersister>,
        presenter: Arc<dyn InteractionPresenter>,
        clock: Arc<dyn Clock>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            oracle,
            deferred,
            replay,
            policy,
            repos,
            scheduler,
            alarms,
            hub,
            snooze,
            presenter,
            clock,
            settings,
        }
    }

    /// Entry point for a tap (`action_id` absent or empty) or action button.
    pub async fn on_notification_response(
        &self,
        payload: Option<&str>,
        action_id: Option<&str>,
        notification_id: Option<i32>,
    ) -> RouteOutcome {
        let Some(payload) = payload.map(str::trim).filter(|p| !p.is_empty()) else {
            debug!("notification response without payload");
            return RouteOutcome::Dropped(DropReason::MissingPayload);
        };
        let action_id = action_id.map(str::trim).unwrap_or_default();

        if self.device_locked().await {
            let interaction =
                DeferredInteraction::new(payload, action_id, notification_id, self.clock.now());
            return self.defer(&interaction, false).await;
        }

        self.dispatch(Stage::Live, payload, action_id, notification_id)
            .await
    }

    /// Replay the deferred interaction, if any, once the device is unlocked.
    pub async fn process_pending_tap_if_unlocked(&self) -> RouteOutcome {
        let interaction = match self.deferred.take().await {
            Ok(Some(interaction)) => interaction,
            Ok(None) => return RouteOutcome::Idle,
            Err(e) => {
                warn!(error = %e, "could not read deferred interaction");
                return RouteOutcome::Failed;
            }
        };

        if self.device_locked().await {
            return self.defer(&interaction, true).await;
        }

        if let Ok(parsed) = NotificationPayload::parse(&interaction.payload)
            && let Some(reason) = self.validate(&parsed).await
        {
            return self.skipped(Stage::Deferred, reason, &interaction.payload);
        }

        if interaction.age(self.clock.now()) > self.settings.max_deferred_age {
            return self.skipped(Stage::Deferred, SkipReason::DeferredStale, &interaction.payload);
        }

        if !self.notification_active(&interaction).await {
            return self.skipped(
                Stage::Deferred,
                SkipReason::NotificationInactive,
                &interaction.payload,
            );
        }

        let signature = interaction.signature();
        match self.replay.is_replay(&signature).await {
            Ok(true) => {
                return self.skipped(
                    Stage::Deferred,
                    SkipReason::ReplayDetected,
                    &interaction.payload,
                );
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "replay ledger unavailable, processing anyway"),
        }
        if let Err(e) = self.replay.mark_processed(&signature).await {
            warn!(error = %e, "could not record deferred interaction in replay ledger");
        }

        self.dispatch(
            Stage::Deferred,
            &interaction.payload,
            &interaction.action_id,
            interaction.notification_id,
        )
        .await
    }

    async fn device_locked(&self) -> bool {
        match self.oracle.is_locked().await {
            Ok(locked) => locked,
            Err(e) => {
                let assume_locked = self.settings.lock_query_failure == LockQueryFailure::Defer;
                warn!(error = %e, assume_locked, "device lock state unknown");
                assume_locked
            }
        }
    }

    async fn defer(&self, interaction: &DeferredInteraction, redeferred: bool) -> RouteOutcome {
        match self.deferred.store(interaction).await {
            Ok(()) => {
                trace::notification_deferred(
                    &interaction.payload,
                    &interaction.action_id,
                    redeferred,
                );
                if redeferred {
                    RouteOutcome::Redeferred
                } else {
                    RouteOutcome::Deferred
                }
            }
            Err(e) => {
                error!(error = %e, payload = %interaction.payload, "failed to store deferred interaction, dropping it");
                RouteOutcome::Dropped(DropReason::StorageFailure)
            }
        }
    }

    /// Module policy, then entity existence for task/habit payloads.
    ///
    /// Lookup failures are logged and treated as passing.
    async fn validate(&self, payload: &NotificationPayload) -> Option<SkipReason> {
        match self.policy.is_enabled(&payload.module).await {
            Ok(false) => return Some(SkipReason::PolicyDisabled),
            Ok(true) => {}
            Err(e) => warn!(error = %e, module = %payload.module, "module policy unavailable, assuming enabled"),
        }

        let kind = payload.module.entity_kind()?;
        match self.repos.for_kind(kind).exists(&payload.entity_id).await {
            Ok(true) => None,
            Ok(false) => Some(SkipReason::EntityDeleted),
            Err(e) => {
                warn!(error = %e, entity_id = %payload.entity_id, "entity lookup failed, assuming it exists");
                None
            }
        }
    }

    /// Whether the originating notification is still scheduled or shown.
    ///
    /// Alarm-delivered reminders never appear in the scheduler's pending list,
    /// so the alarm ledger is consulted as well.
    async fn notification_active(&self, interaction: &DeferredInteraction) -> bool {
        let originated = |id: i32, payload: Option<&str>| {
            interaction.notification_id == Some(id) || payload == Some(interaction.payload.as_str())
        };

        match self.scheduler.pending().await {
            Ok(pending) if pending.iter().any(|p| originated(p.id, p.payload.as_deref())) => {
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "pending notifications unavailable, assuming active");
                return true;
            }
        }

        match self.alarms.entries().await {
            Ok(alarms) => alarms.iter().any(|a| originated(a.id, Some(a.payload.as_str()))),
            Err(e) => {
                warn!(error = %e, "alarm ledger unavailable, assuming active");
                true
            }
        }
    }

    async fn dispatch(
        &self,
        stage: Stage,
        payload: &str,
        action_id: &str,
        notification_id: Option<i32>,
    ) -> RouteOutcome {
        if action_id.is_empty() {
            self.handle_tap(stage, payload).await
        } else {
            self.handle_action(stage, payload, action_id, notification_id)
                .await
        }
    }

    async fn handle_action(
        &self,
        stage: Stage,
        payload: &str,
        action_id: &str,
        notification_id: Option<i32>,
    ) -> RouteOutcome {
        let parsed = match NotificationPayload::parse(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, action_id, "dropping action with malformed payload");
                return RouteOutcome::Dropped(DropReason::MalformedPayload);
            }
        };
        if let Some(reason) = self.validate(&parsed).await {
            return self.skipped(stage, reason, payload);
        }

        if let Some(minutes) = parse_snooze_action(action_id) {
            return match parsed.module.entity_kind() {
                Some(kind) => {
                    match self
                        .snooze
                        .snooze(kind, &parsed.entity_id, &parsed, notification_id, minutes)
                        .await
                    {
                        Ok(_) => self.dispatched(stage, Dispatch::Snooze, payload),
                        Err(e) => {
                            warn!(error = %e, entity_id = %parsed.entity_id, "snooze failed");
                            RouteOutcome::Failed
                        }
                    }
                }
                None => match self.hub.snooze(payload, notification_id, minutes).await {
                    Ok(true) => self.dispatched(stage, Dispatch::HubSnooze, payload),
                    Ok(false) => self.skipped(stage, SkipReason::Unhandled, payload),
                    Err(e) => {
                        warn!(error = %e, module = %parsed.module, "hub snooze failed");
                        RouteOutcome::Failed
                    }
                },
            };
        }

        match self
            .hub
            .handle_action(action_id, payload, notification_id)
            .await
        {
            Ok(true) => self.dispatched(stage, Dispatch::HubAction, payload),
            Ok(false) => {
                warn!(action_id, module = %parsed.module, "no adapter handled notification action");
                self.skipped(stage, SkipReason::Unhandled, payload)
            }
            Err(e) => {
                warn!(error = %e, action_id, "notification action failed");
                RouteOutcome::Failed
            }
        }
    }

    async fn handle_tap(&self, stage: Stage, payload: &str) -> RouteOutcome {
        match self.hub.handle_tap(payload).await {
            Ok(true) => return self.dispatched(stage, Dispatch::HubTap, payload),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "hub tap handler failed, trying task/habit path"),
        }

        let parsed = match NotificationPayload::parse(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "dropping tap with malformed payload");
                return RouteOutcome::Dropped(DropReason::MalformedPayload);
            }
        };
        let Some(kind) = parsed.module.entity_kind() else {
            return self.skipped(stage, SkipReason::Unhandled, payload);
        };
        if let Some(reason) = self.validate(&parsed).await {
            return self.skipped(stage, reason, payload);
        }

        let entity = match self.repos.for_kind(kind).get_by_id(&parsed.entity_id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return self.skipped(stage, SkipReason::EntityDeleted, payload),
            Err(e) => {
                warn!(error = %e, entity_id = %parsed.entity_id, "could not load tapped entity");
                return RouteOutcome::Failed;
            }
        };
        match self.presenter.present(&entity, &parsed).await {
            Ok(()) => self.dispatched(stage, Dispatch::Presented, payload),
            Err(e) => {
                warn!(error = %e, entity_id = %entity.id, "presenting tapped entity failed");
                RouteOutcome::Failed
            }
        }
    }

    fn skipped(&self, stage: Stage, reason: SkipReason, payload: &str) -> RouteOutcome {
        trace::notification_skipped(stage, reason.as_ref(), payload);
        RouteOutcome::Skipped(reason)
    }

    fn dispatched(&self, stage: Stage, dispatch: Dispatch, payload: &str) -> RouteOutcome {
        trace::notification_dispatched(stage, &dispatch.to_string(), payload);
        RouteOutcome::Dispatched(dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let settings = RouterSettings::from_config(&NotificationsConfig {
            max_deferred_age_secs: 60,
            replay_ttl_secs: 120,
            lock_query_failure: LockQueryFailure::Proceed,
        });
        assert_eq!(settings.max_deferred_age, Duration::minutes(1));
        assert_eq!(settings.lock_query_failure, LockQueryFailure::Proceed);
        assert_eq!(RouterSettings::default().max_deferred_age, Duration::hours(6));
    }

    #[test]
    fn reason_codes() {
        assert_eq!(SkipReason::PolicyDisabled.as_ref(), "policy_disabled");
        assert_eq!(SkipReason::NotificationInactive.to_string(), "notification_inactive");
        assert_eq!(Dispatch::HubSnooze.to_string(), "hub_snooze");
    }
}
