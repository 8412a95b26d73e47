//! Services the gym's jobs depend on, provided through the injector.
//!
//! Both are in-memory: notifications collect in an outbox and memberships
//! live in a map. Production wiring swaps these for the mail provider and the
//! members database behind the same types.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use gymjobs_functions::Injector;

/// Message to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub template: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Notifier that keeps every message in memory.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Mutex<Vec<Notification>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        tracing::debug!(to = %notification.to, template = %notification.template, "queued notification");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub member_id: String,
    pub email: String,
    pub expires_on: NaiveDate,
    pub active: bool,
}

/// Memberships and check-in streaks, keyed by member id.
#[derive(Debug, Default)]
pub struct MemberDirectory {
    memberships: Mutex<BTreeMap<String, Membership>>,
    streaks: Mutex<BTreeMap<String, u32>>,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, membership: Membership) {
        self.memberships
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(membership.member_id.clone(), membership);
    }

    pub fn get(&self, member_id: &str) -> Option<Membership> {
        self.memberships
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member_id)
            .cloned()
    }

    /// Deactivate every active membership that expired before `today`;
    /// returns the ones that changed.
    pub fn expire_due(&self, today: NaiveDate) -> Vec<Membership> {
        let mut memberships = self
            .memberships
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        memberships
            .values_mut()
            .filter(|m| m.active && m.expires_on < today)
            .map(|m| {
                m.active = false;
                m.clone()
            })
            .collect()
    }

    /// Count one more check-in; returns the new streak.
    pub fn record_check_in(&self, member_id: &str) -> u32 {
        let mut streaks = self.streaks.lock().unwrap_or_else(PoisonError::into_inner);
        let streak = streaks.entry(member_id.to_string()).or_insert(0);
        *streak += 1;
        *streak
    }

    pub fn streak(&self, member_id: &str) -> u32 {
        self.streaks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member_id)
            .copied()
            .unwrap_or(0)
    }
}

/// Everything bootstrap puts into the injector.
#[derive(Clone)]
pub struct Services {
    pub notifier: Arc<dyn Notifier>,
    pub outbox: Arc<Outbox>,
    pub members: Arc<MemberDirectory>,
}

impl Services {
    /// In-memory services for local runs and tests.
    pub fn in_memory() -> Self {
        let outbox = Arc::new(Outbox::new());
        Self {
            notifier: outbox.clone(),
            outbox,
            members: Arc::new(MemberDirectory::new()),
        }
    }

    pub fn injector(&self) -> Injector {
        Injector::new()
            .with(self.notifier.clone())
            .with(self.members.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(id: &str, expires_on: &str) -> Membership {
        Membership {
            member_id: id.to_string(),
            email: format!("{id}@example.com"),
            expires_on: expires_on.parse().unwrap(),
            active: true,
        }
    }

    #[test]
    fn expire_due_only_touches_lapsed_active_memberships() {
        let directory = MemberDirectory::new();
        directory.upsert(membership("m-1", "2026-01-01"));
        directory.upsert(membership("m-2", "2026-12-31"));

        let today: NaiveDate = "2026-06-01".parse().unwrap();
        let expired = directory.expire_due(today);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].member_id, "m-1");
        assert!(!directory.get("m-1").unwrap().active);
        assert!(directory.get("m-2").unwrap().active);
        assert!(directory.expire_due(today).is_empty());
    }

    #[test]
    fn streak_counts_check_ins() {
        let directory = MemberDirectory::new();
        assert_eq!(directory.record_check_in("m-1"), 1);
        assert_eq!(directory.record_check_in("m-1"), 2);
        assert_eq!(directory.streak("m-1"), 2);
        assert_eq!(directory.streak("m-2"), 0);
    }

    #[tokio::test]
    async fn outbox_keeps_sent_notifications() {
        let services = Services::in_memory();
        services
            .notifier
            .send(Notification {
                to: "ana@example.com".into(),
                template: "welcome".into(),
                data: serde_json::Value::Null,
            })
            .await
            .unwrap();

        assert_eq!(services.outbox.sent().len(), 1);
        assert!(services.injector().get::<Arc<MemberDirectory>>().is_some());
    }
}
