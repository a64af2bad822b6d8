//! System resource profiles and adaptive planning output.

use serde::{Deserialize, Serialize};

use crate::plan::ExecutionPlan;

/// A snapshot of the resources available to the caller's executor.
///
/// Supplied per planning call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceProfile {
    /// Logical CPUs available for validation work
    pub available_cpus: usize,

    /// Free memory in bytes
    pub available_memory_bytes: u64,

    /// Round-trip latency to the relevant network services
    pub network_latency_ms: u64,

    /// Disk I/O saturation in [0, 1]
    pub disk_io_load: f64,
}

impl ResourceProfile {
    /// Probe the host for a live profile.
    ///
    /// CPU count comes from the OS; the remaining figures are conservative
    /// defaults for callers that do not measure them.
    pub fn detect() -> Self {
        Self {
            available_cpus: num_cpus::get(),
            ..Self::default()
        }
    }
}

impl Default for ResourceProfile {
    fn default() -> Self {
        Self {
            available_cpus: 4,
            available_memory_bytes: 8 * 1024 * 1024 * 1024,
            network_latency_ms: 20,
            disk_io_load: 0.5,
        }
    }
}

/// Concurrency tuning derived from a resource profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAware {
    /// Concurrency the executor should run the plan at
    pub recommended_concurrency: usize,

    /// Why the recommendation landed where it did, one note per adjustment
    pub rationale: Vec<String>,
}

/// Resource-class-specific scheduling advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResourceSchedulingHint {
    /// Schedule network-bound criteria earliest and cap how many run
    /// against a slow network at once.
    #[serde(rename_all = "camelCase")]
    NetworkPrioritization {
        /// Network-tagged criteria the hint applies to
        criteria: Vec<String>,
        /// Cap on their mutual concurrency
        max_concurrency: usize,
        /// Human-readable explanation
        detail: String,
    },
}

/// Adaptive tuning attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveOptimizations {
    /// Concurrency recommendation and its rationale
    pub system_aware: SystemAware,

    /// Per-resource-class scheduling advice
    pub resource_scheduling: Vec<ResourceSchedulingHint>,
}

/// A wave plan tuned to a live resource profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptivePlan {
    /// The wave schedule at the recommended concurrency
    pub plan: ExecutionPlan,

    /// How and why the schedule was tuned
    pub adaptive_optimizations: AdaptiveOptimizations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_reports_at_least_one_cpu() {
        let profile = ResourceProfile::detect();
        assert!(profile.available_cpus >= 1);
    }

    #[test]
    fn test_profile_wire_format() {
        let profile = ResourceProfile {
            available_cpus: 8,
            available_memory_bytes: 1024,
            network_latency_ms: 150,
            disk_io_load: 0.9,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["availableCpus"], 8);
        assert_eq!(json["networkLatencyMs"], 150);
    }

    #[test]
    fn test_network_prioritization_wire_format() {
        let hint = ResourceSchedulingHint::NetworkPrioritization {
            criteria: vec!["security-validation".to_string()],
            max_concurrency: 2,
            detail: "slow network".to_string(),
        };
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["strategy"], "network_prioritization");
        assert_eq!(json["maxConcurrency"], 2);
    }
}
