//! Office-level feature flags that gate rules.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::FeatureFlagError;
use crate::result::RuleId;

/// Flags consulted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureFlag {
    RestrictServiceProTimeAvailability,
    InsideSales,
    RouteSummary,
    PredictiveServiceDuration,
    /// String flag: comma separated rule ids disabled for the office.
    DisabledOptimizationRules,
}

impl FeatureFlag {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureFlag::RestrictServiceProTimeAvailability => {
                "isRestrictServiceProTimeAvailabilityEnabled"
            }
            FeatureFlag::InsideSales => "isInsideSalesEnabled",
            FeatureFlag::RouteSummary => "isRouteSummaryEnabled",
            FeatureFlag::PredictiveServiceDuration => "isServiceDurationPredictiveModelEnabled",
            FeatureFlag::DisabledOptimizationRules => "optimizationDisabledRules",
        }
    }
}

/// Feature-flag storage.
pub trait FeatureFlagService: Send + Sync {
    fn is_feature_enabled_for_office(&self, office_id: i64, flag: &str) -> Result<bool, FeatureFlagError>;

    fn get_feature_flag_string_value_for_office(
        &self,
        office_id: i64,
        flag: &str,
        default: &str,
    ) -> Result<String, FeatureFlagError>;
}

/// Caches flag answers per office so every rule of a pass sees the same
/// value. Mutually exclusive rules rely on this.
pub struct FeatureGate {
    service: Arc<dyn FeatureFlagService>,
    cache: Mutex<HashMap<(i64, FeatureFlag), bool>>,
}

impl FeatureGate {
    pub fn new(service: Arc<dyn FeatureFlagService>) -> Self {
        Self {
            service,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self, office_id: i64, flag: FeatureFlag) -> Result<bool, FeatureFlagError> {
        if let Some(enabled) = self.cached(office_id, flag) {
            return Ok(enabled);
        }

        let enabled = self
            .service
            .is_feature_enabled_for_office(office_id, flag.name())?;
        debug!(office_id, flag = flag.name(), enabled, "feature flag resolved");

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert((office_id, flag), enabled);
        }
        Ok(enabled)
    }

    /// Rules disabled for the office. Unknown names are logged and ignored.
    pub fn disabled_rules(&self, office_id: i64) -> Result<BTreeSet<RuleId>, FeatureFlagError> {
        let value = self.service.get_feature_flag_string_value_for_office(
            office_id,
            FeatureFlag::DisabledOptimizationRules.name(),
            "",
        )?;

        let mut disabled = BTreeSet::new();
        for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name.parse::<RuleId>() {
                Ok(rule_id) => {
                    disabled.insert(rule_id);
                }
                Err(err) => warn!(office_id, %err, "ignoring disabled rule"),
            }
        }
        Ok(disabled)
    }

    /// Forgets cached answers, e.g. between two jobs sharing the gate.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, office_id: i64, flag: FeatureFlag) -> Option<bool> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&(office_id, flag)).copied())
    }
}

/// In-process flag storage for simulations and tests.
#[derive(Debug, Default)]
pub struct InMemoryFeatureFlags {
    enabled: Mutex<HashSet<(i64, String)>>,
    values: Mutex<HashMap<(i64, String), String>>,
    lookups: Mutex<usize>,
}

impl InMemoryFeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(self, office_id: i64, flag: FeatureFlag) -> Self {
        if let Ok(mut enabled) = self.enabled.lock() {
            enabled.insert((office_id, flag.name().to_string()));
        }
        self
    }

    pub fn with_value(self, office_id: i64, flag: FeatureFlag, value: &str) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert((office_id, flag.name().to_string()), value.to_string());
        }
        self
    }

    /// Number of boolean lookups served.
    pub fn lookups(&self) -> usize {
        self.lookups.lock().map(|count| *count).unwrap_or(0)
    }
}

impl FeatureFlagService for InMemoryFeatureFlags {
    fn is_feature_enabled_for_office(&self, office_id: i64, flag: &str) -> Result<bool, FeatureFlagError> {
        if let Ok(mut count) = self.lookups.lock() {
            *count += 1;
        }
        let enabled = self
            .enabled
            .lock()
            .map_err(|_| FeatureFlagError::Unavailable("flag store poisoned".to_string()))?;
        Ok(enabled.contains(&(office_id, flag.to_string())))
    }

    fn get_feature_flag_string_value_for_office(
        &self,
        office_id: i64,
        flag: &str,
        default: &str,
    ) -> Result<String, FeatureFlagError> {
        let values = self
            .values
            .lock()
            .map_err(|_| FeatureFlagError::Unavailable("flag store poisoned".to_string()))?;
        Ok(values
            .get(&(office_id, flag.to_string()))
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }
}
