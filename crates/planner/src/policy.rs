//! Tunable scheduling policy.
//!
//! Caps and thresholds here were inferred from observed pipeline behavior,
//! not a published constant; callers may override any of them.

use checkflow_core::ResourceTag;
use std::collections::HashMap;

/// Policy knobs for wave packing and adaptive tuning.
#[derive(Debug, Clone)]
pub struct PlannerPolicy {
    /// Per-resource-class concurrency cap within a single wave.
    /// Classes without an entry are uncapped.
    pub resource_caps: HashMap<ResourceTag, usize>,

    /// A solo non-parallelizable wave flags `load_balance` when its duration
    /// exceeds this multiple of the mean of the other waves' durations.
    pub load_balance_factor: f64,

    /// Assumed memory footprint per concurrently running memory-tagged
    /// criterion.
    pub memory_per_slot_bytes: u64,

    /// Disk I/O load at or below which the host counts as idle.
    pub low_disk_io_load: f64,

    /// Network latency at or below which the network counts as fast.
    pub low_network_latency_ms: u64,

    /// Network latency above which network-tagged criteria get a
    /// prioritization hint.
    pub high_network_latency_ms: u64,

    /// Mutual concurrency cap advised for network-tagged criteria on a
    /// slow network.
    pub network_concurrency_cap: usize,

    /// Extra concurrency granted when both disk and network are idle.
    pub burst_bonus: usize,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        let mut resource_caps = HashMap::new();
        // The working tree does not tolerate concurrent writers
        resource_caps.insert(ResourceTag::Filesystem, 1);

        Self {
            resource_caps,
            load_balance_factor: 2.0,
            memory_per_slot_bytes: 512 * 1024 * 1024,
            low_disk_io_load: 0.3,
            low_network_latency_ms: 50,
            high_network_latency_ms: 100,
            network_concurrency_cap: 2,
            burst_bonus: 2,
        }
    }
}

impl PlannerPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the in-wave concurrency cap for a resource class.
    pub fn with_resource_cap(mut self, tag: ResourceTag, cap: usize) -> Self {
        self.resource_caps.insert(tag, cap);
        self
    }

    /// Set the load-balance flagging factor.
    pub fn with_load_balance_factor(mut self, factor: f64) -> Self {
        self.load_balance_factor = factor;
        self
    }

    /// Set the assumed per-slot memory footprint.
    pub fn with_memory_per_slot(mut self, bytes: u64) -> Self {
        self.memory_per_slot_bytes = bytes;
        self
    }

    /// In-wave cap for a resource class, if one is configured.
    pub fn cap_for(&self, tag: ResourceTag) -> Option<usize> {
        self.resource_caps.get(&tag).copied()
    }
}
