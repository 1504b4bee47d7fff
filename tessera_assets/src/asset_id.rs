use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Stable identifier of an asset, derived from the owning package id and the asset's symbolic name
///
/// The upper 32 bits come from the package id hash and the lower 32 bits from the asset name hash.
/// Ids are always carried as the full 64 bits.
///
/// Hashing goes through std's `DefaultHasher`, whose algorithm is not guaranteed across Rust
/// releases. Ids are stable between runs of one build but must not be persisted.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(u64);

impl AssetId {
    /// Derive the id of `asset_name` inside of `package_id`
    pub fn generate(package_id: &str, asset_name: &str) -> Self {
        let package_hash = hash_component(package_id);
        let asset_hash = hash_component(asset_name);
        Self((package_hash << 32) | (asset_hash & 0xFFFF_FFFF))
    }

    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

fn hash_component(component: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    component.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({:#018x})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<AssetId> for u64 {
    fn from(value: AssetId) -> Self {
        value.0
    }
}
