//! Access point resolution cache.
//!
//! Maps a normalized hardware address (BSSID) to the decoded location of the
//! access point with that address, so a tracked device reporting its BSSID
//! can be shown as "section X, floor Y, wing Z".
//!
//! The cache is rebuilt from scratch on every snapshot of the access point
//! collection and swapped in as a whole. Readers hold an `Arc` to whichever
//! snapshot was current when they looked, so they see either the previous
//! map or the new one, never a mix. There is no per-entry mutation.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use futures::{Stream, StreamExt};
use serde::{Serialize, Serializer};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::decode::LocationCodeDecoder;
use crate::domain::{LocationCode, MacKey};
use crate::records::AccessPointRecord;

/// Errors from setting up the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// `subscribe` was called outside a tokio runtime
    #[error("snapshot subscription requires a running tokio runtime")]
    NoRuntime,
}

/// An access point joined with its decoded location.
///
/// Structural fields are blank when the access point's location text holds
/// no location code; the entry still exists so the name and raw location can
/// be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub ap_name: String,
    /// The raw location text.
    pub location: String,
    pub opgang: String,
    pub etage: String,
    pub afsnit: String,
    #[serde(serialize_with = "serialize_code_or_blank")]
    pub afsnitsnr: Option<LocationCode>,
}

impl ResolvedLocation {
    /// Join a record with its decoded location.
    pub fn from_record(record: &AccessPointRecord, decoder: &LocationCodeDecoder) -> Self {
        let parsed = decoder.decode(Some(&record.location));
        Self {
            ap_name: record.ap_name.clone(),
            location: record.location.clone(),
            opgang: parsed.as_ref().map(|p| p.opgang.clone()).unwrap_or_default(),
            etage: parsed.as_ref().map(|p| p.etage_label()).unwrap_or_default(),
            afsnit: parsed.as_ref().map(|p| p.afsnit.clone()).unwrap_or_default(),
            afsnitsnr: parsed.map(|p| p.afsnitsnr),
        }
    }

    /// Whether the location text decoded to a location code.
    pub fn is_decoded(&self) -> bool {
        self.afsnitsnr.is_some()
    }
}

fn serialize_code_or_blank<S: Serializer>(
    code: &Option<LocationCode>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(code.as_ref().map(LocationCode::as_str).unwrap_or(""))
}

/// One immutable generation of the cache.
#[derive(Debug, Default)]
pub struct AccessPointSnapshot {
    revision: u64,
    by_address: HashMap<MacKey, ResolvedLocation>,
    /// Addresses per decoded code, sorted by AP name then address.
    by_code: HashMap<LocationCode, Vec<MacKey>>,
}

impl AccessPointSnapshot {
    /// Build a snapshot from a complete record set.
    ///
    /// Records without an address are skipped; a later record with the same
    /// normalized address replaces an earlier one.
    fn build(records: &[AccessPointRecord], decoder: &LocationCodeDecoder) -> Self {
        let mut by_address = HashMap::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            let Some(key) = MacKey::normalize(&record.mac_address) else {
                skipped += 1;
                continue;
            };
            by_address.insert(key, ResolvedLocation::from_record(record, decoder));
        }

        let mut by_code: HashMap<LocationCode, Vec<MacKey>> = HashMap::new();
        for (key, resolved) in &by_address {
            if let Some(code) = resolved.afsnitsnr {
                by_code.entry(code).or_default().push(key.clone());
            }
        }
        for keys in by_code.values_mut() {
            keys.sort_by(|a, b| {
                by_address[a]
                    .ap_name
                    .cmp(&by_address[b].ap_name)
                    .then_with(|| a.cmp(b))
            });
        }

        debug!(
            records = records.len(),
            addresses = by_address.len(),
            codes = by_code.len(),
            skipped,
            "built access point snapshot"
        );

        Self {
            revision: 0,
            by_address,
            by_code,
        }
    }

    /// Look up a normalized address.
    pub fn get(&self, key: &MacKey) -> Option<&ResolvedLocation> {
        self.by_address.get(key)
    }

    /// All access points whose location decoded to `code`.
    pub fn at_code(&self, code: &LocationCode) -> Vec<&ResolvedLocation> {
        self.by_code
            .get(code)
            .map(|keys| keys.iter().filter_map(|k| self.by_address.get(k)).collect())
            .unwrap_or_default()
    }

    /// Iterate over every entry.
    pub fn iter(&self) -> impl Iterator<Item = (&MacKey, &ResolvedLocation)> {
        self.by_address.iter()
    }

    /// The revision this snapshot was installed as; 0 for the initial empty
    /// cache.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

/// Address → location lookup, rebuilt wholesale from access point snapshots.
///
/// Cloning is cheap and clones share the same map.
#[derive(Clone)]
pub struct AccessPointCache {
    inner: Arc<Inner>,
}

struct Inner {
    decoder: LocationCodeDecoder,
    current: RwLock<Arc<AccessPointSnapshot>>,
    revision: watch::Sender<u64>,
    /// Id of the subscription allowed to install snapshots.
    active_subscription: AtomicU64,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl AccessPointCache {
    /// Create an empty cache.
    pub fn new(decoder: LocationCodeDecoder) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                decoder,
                current: RwLock::new(Arc::new(AccessPointSnapshot::default())),
                revision,
                active_subscription: AtomicU64::new(0),
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Replace the whole map with one built from `records`.
    ///
    /// Returns the new revision.
    pub fn rebuild(&self, records: &[AccessPointRecord]) -> u64 {
        self.inner.install(records, None)
    }

    /// Resolve a hardware address.
    ///
    /// The address is trimmed and lower-cased before lookup. Missing, blank
    /// and unknown addresses all return `None`.
    pub fn resolve(&self, address: Option<&str>) -> Option<ResolvedLocation> {
        let key = MacKey::normalize(address?)?;
        self.snapshot().get(&key).cloned()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<AccessPointSnapshot> {
        self.inner.current()
    }

    /// Watch the revision counter; it changes after every swap.
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Feed the cache from a stream of access point snapshots.
    ///
    /// Each `Ok` snapshot triggers one rebuild. An `Err` clears the cache and
    /// ends the subscription: after an upstream failure no location is known
    /// rather than a stale one. Any previous subscription is released first,
    /// and a released subscription can no longer install snapshots.
    ///
    /// The subscription runs on the current tokio runtime and stops when the
    /// stream ends or the last clone of the cache is dropped.
    pub fn subscribe<S, E>(&self, snapshots: S) -> Result<(), CacheError>
    where
        S: Stream<Item = Result<Vec<AccessPointRecord>, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let mut slot = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let id = self.inner.active_subscription.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = slot.take() {
            previous.abort();
            debug!(subscription = id - 1, "released access point subscription");
        }

        let inner = Arc::downgrade(&self.inner);
        *slot = Some(runtime.spawn(run_subscription(inner, id, snapshots)));
        info!(subscription = id, "subscribed to access point snapshots");
        Ok(())
    }

    /// Stop consuming snapshots. The current map is kept.
    pub fn unsubscribe(&self) {
        self.inner.active_subscription.fetch_add(1, Ordering::SeqCst);
        let previous = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            previous.abort();
            debug!("released access point subscription");
        }
    }

    /// The decoder used for rebuilds.
    pub fn decoder(&self) -> &LocationCodeDecoder {
        &self.inner.decoder
    }
}

impl Default for AccessPointCache {
    fn default() -> Self {
        Self::new(LocationCodeDecoder::default())
    }
}

impl fmt::Debug for AccessPointCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("AccessPointCache")
            .field("revision", &snapshot.revision())
            .field("entries", &snapshot.len())
            .finish()
    }
}

impl Inner {
    fn current(&self) -> Arc<AccessPointSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Build and swap in a snapshot. With `owner` set, the swap only happens
    /// while that subscription is still the active one.
    fn install(&self, records: &[AccessPointRecord], owner: Option<u64>) -> u64 {
        let mut snapshot = AccessPointSnapshot::build(records, &self.decoder);

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(owner) = owner
            && self.active_subscription.load(Ordering::SeqCst) != owner
        {
            debug!(subscription = owner, "dropping snapshot from released subscription");
            return current.revision;
        }

        snapshot.revision = current.revision + 1;
        let revision = snapshot.revision;
        let entries = snapshot.len();
        *current = Arc::new(snapshot);
        drop(current);

        self.revision.send_replace(revision);
        info!(revision, entries, "access point cache rebuilt");
        revision
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self
            .subscription
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

async fn run_subscription<S, E>(inner: Weak<Inner>, id: u64, snapshots: S)
where
    S: Stream<Item = Result<Vec<AccessPointRecord>, E>>,
    E: fmt::Display,
{
    let mut snapshots = Box::pin(snapshots);

    while let Some(item) = snapshots.next().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        match item {
            Ok(records) => {
                inner.install(&records, Some(id));
            }
            Err(e) => {
                warn!(subscription = id, error = %e, "access point snapshot stream failed, clearing cache");
                inner.install(&[], Some(id));
                return;
            }
        }
    }

    debug!(subscription = id, "access point snapshot stream ended");
}
