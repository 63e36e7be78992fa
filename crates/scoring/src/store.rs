//! The scored subject, as read from the CRM master records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdeck_core::{BusinessId, StoreId, VerticalId};

use crate::signals::UpstreamError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Prospect,
    Inactive,
    Churned,
}

impl LifecycleStatus {
    /// Coarse communication signal: active > prospect > everything else.
    pub fn communication_score(self) -> f64 {
        match self {
            LifecycleStatus::Active => 80.0,
            LifecycleStatus::Prospect => 50.0,
            LifecycleStatus::Inactive | LifecycleStatus::Churned => 20.0,
        }
    }

    /// Whether fleet-wide scoring should include stores in this state.
    pub fn is_scoreable(self) -> bool {
        matches!(self, LifecycleStatus::Active | LifecycleStatus::Prospect)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::Active => "active",
            LifecycleStatus::Prospect => "prospect",
            LifecycleStatus::Inactive => "inactive",
            LifecycleStatus::Churned => "churned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LifecycleStatus::Active),
            "prospect" => Some(LifecycleStatus::Prospect),
            "inactive" => Some(LifecycleStatus::Inactive),
            "churned" => Some(LifecycleStatus::Churned),
            _ => None,
        }
    }
}

/// Store/account master record. Owned by the CRM; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub business_id: BusinessId,
    pub vertical_id: Option<VerticalId>,
    pub name: String,
    pub status: LifecycleStatus,
    pub last_order_at: Option<DateTime<Utc>>,
    pub last_visit_at: Option<DateTime<Utc>>,
}

/// Optional business/vertical narrowing used by fleet-wide operations.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreScope {
    pub business_id: Option<BusinessId>,
    pub vertical_id: Option<VerticalId>,
}

impl StoreScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, business_id: BusinessId, vertical_id: Option<VerticalId>) -> bool {
        let business_ok = self.business_id.is_none_or(|b| b == business_id);
        let vertical_ok = match self.vertical_id {
            None => true,
            Some(v) => vertical_id == Some(v),
        };
        business_ok && vertical_ok
    }
}

/// Read access to store master records.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn get_store(&self, store_id: StoreId) -> Result<Option<Store>, UpstreamError>;

    /// Stores eligible for fleet-wide scoring within `scope`.
    async fn list_scoreable(&self, scope: StoreScope) -> Result<Vec<Store>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn communication_score_orders_statuses() {
        assert!(LifecycleStatus::Active.communication_score() > LifecycleStatus::Prospect.communication_score());
        assert!(LifecycleStatus::Prospect.communication_score() > LifecycleStatus::Churned.communication_score());
    }

    #[test]
    fn scope_filters_by_business_and_vertical() {
        let business = BusinessId::new();
        let vertical = VerticalId::new();

        assert!(StoreScope::all().matches(business, None));

        let scoped = StoreScope {
            business_id: Some(business),
            vertical_id: Some(vertical),
        };
        assert!(scoped.matches(business, Some(vertical)));
        assert!(!scoped.matches(business, None));
        assert!(!scoped.matches(BusinessId::new(), Some(vertical)));
    }

    #[test]
    fn status_parses_round_trip() {
        for s in [LifecycleStatus::Active, LifecycleStatus::Prospect, LifecycleStatus::Inactive, LifecycleStatus::Churned] {
            assert_eq!(LifecycleStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(LifecycleStatus::parse("lead"), None);
    }
}
