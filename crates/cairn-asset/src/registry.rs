//! Process-wide memoization of asset imports

use crate::asset::{Asset, AssetKey};
use crate::manifest::{AssetManifest, ManifestEntry};
use crate::storage::AssetStorage;
use cairn_core::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolution state of one key. `None` until an import succeeded.
#[derive(Default)]
struct Slot {
    resolved: Mutex<Option<Arc<Asset>>>,
}

/// Memoizes [`AssetStorage::import`] per `(namespace, path)`.
///
/// Each key is imported at most once per cache generation. Concurrent
/// callers asking for the same key wait on the first caller's import and
/// share its result; different keys import in parallel. [`clear`] starts a
/// new generation and removes everything published so far.
///
/// [`clear`]: AssetRegistry::clear
pub struct AssetRegistry {
    storage: AssetStorage,
    slots: Mutex<HashMap<AssetKey, Arc<Slot>>>,
    /// Held shared by lookups and exclusively by `clear`
    generation: RwLock<()>,
}

impl AssetRegistry {
    pub fn new(storage: AssetStorage) -> Self {
        Self {
            storage,
            slots: Mutex::new(HashMap::new()),
            generation: RwLock::new(()),
        }
    }

    pub fn storage(&self) -> &AssetStorage {
        &self.storage
    }

    /// The resolved version of `asset`, importing it on first use.
    ///
    /// A failed import drops the key's slot again, so unresolvable
    /// references leave nothing behind.
    pub fn get(&self, asset: &Asset) -> Result<Arc<Asset>> {
        let _generation = self.generation.read();
        let key = asset.key();

        loop {
            let slot = Arc::clone(self.slots.lock().entry(key.clone()).or_default());

            let mut resolved = slot.resolved.lock();
            if let Some(existing) = resolved.as_ref() {
                tracing::debug!(asset = %asset, "asset cache hit");
                return Ok(Arc::clone(existing));
            }

            // the previous holder failed and dropped this slot
            if !self.is_current(&key, &slot) {
                continue;
            }

            tracing::debug!(asset = %asset, "asset cache miss, importing");
            return match self.storage.import(Asset::new(asset.namespace(), asset.path())) {
                Ok(imported) => {
                    let imported = Arc::new(imported);
                    *resolved = Some(Arc::clone(&imported));
                    Ok(imported)
                }
                Err(e) => {
                    let mut slots = self.slots.lock();
                    if slots.get(&key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                        slots.remove(&key);
                    }
                    Err(e)
                }
            };
        }
    }

    fn is_current(&self, key: &AssetKey, slot: &Arc<Slot>) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Parse a logical reference and resolve it
    pub fn get_reference(&self, reference: &str) -> Result<Arc<Asset>> {
        self.get(&Asset::parse(reference)?)
    }

    /// Resolve every asset, stopping at the first failure
    pub fn warm<'a, I>(&self, assets: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Asset>,
    {
        let mut count = 0;
        for asset in assets {
            self.get(asset)?;
            count += 1;
        }
        tracing::info!(count, "warmed asset cache");
        Ok(count)
    }

    /// Forget every resolved asset and delete all published files.
    ///
    /// Waits for in-flight imports to finish; lookups issued meanwhile wait
    /// for the clear to complete.
    pub fn clear(&self) -> Result<()> {
        let _generation = self.generation.write();
        let forgotten = {
            let mut slots = self.slots.lock();
            let count = slots.len();
            slots.clear();
            count
        };
        tracing::info!(forgotten, "cleared asset cache");
        self.storage.remove_all_stored_files()
    }

    /// Whether a key is currently resolved
    pub fn contains(&self, asset: &Asset) -> bool {
        let Some(slot) = self.slots.lock().get(&asset.key()).cloned() else {
            return false;
        };
        let resolved = slot.resolved.lock().is_some();
        resolved
    }

    /// Number of resolved keys
    pub fn len(&self) -> usize {
        self.resolved_assets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every resolved asset, sorted by key
    pub fn resolved_assets(&self) -> Vec<Arc<Asset>> {
        let slots: Vec<Arc<Slot>> = self.slots.lock().values().cloned().collect();
        let mut assets: Vec<Arc<Asset>> = slots
            .iter()
            .filter_map(|slot| slot.resolved.lock().clone())
            .collect();
        assets.sort_by_key(|asset| asset.key());
        assets
    }

    /// Record of everything resolved so far
    pub fn snapshot(&self) -> AssetManifest {
        AssetManifest {
            assets: self
                .resolved_assets()
                .iter()
                .filter_map(|asset| ManifestEntry::from_asset(asset))
                .collect(),
        }
    }

    /// Seed the cache from a manifest. Keys that are already resolved keep
    /// their current value. Returns the number of keys added.
    pub fn preload(&self, manifest: &AssetManifest) -> Result<usize> {
        let _generation = self.generation.read();

        let mut added = 0;
        for entry in &manifest.assets {
            let asset = entry.to_asset()?;
            let slot = Arc::clone(self.slots.lock().entry(asset.key()).or_default());
            let mut resolved = slot.resolved.lock();
            if resolved.is_none() {
                *resolved = Some(Arc::new(asset));
                added += 1;
            }
        }
        tracing::debug!(added, "preloaded asset cache from manifest");
        Ok(added)
    }
}
