use crate::AssetType;
use std::collections::BTreeMap;

/// Snapshot of registry memory usage, computed on demand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_assets: usize,
    pub loaded_assets: usize,
    /// Sum of loaded data sizes in bytes
    pub total_memory_usage: usize,
    pub memory_by_type: BTreeMap<AssetType, usize>,
}
