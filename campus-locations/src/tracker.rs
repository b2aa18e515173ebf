//! Tracked device state.
//!
//! Tracker devices report the BSSID of the access point they are connected
//! to, plus a heartbeat timestamp. Device documents come from a loosely typed
//! store, so every field is read leniently: a field of the wrong type is
//! treated as absent rather than failing the whole device.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{AccessPointCache, ResolvedLocation};

/// Heartbeat age in milliseconds after which a device counts as offline.
pub const DEFAULT_OFFLINE_THRESHOLD_MS: i64 = 6_000;

/// The state of one tracker device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub id: String,
    pub name: Option<String>,
    pub bssid: Option<String>,
    /// `None` when the device never reported and has no heartbeat.
    pub online: Option<bool>,
    pub last_seen: Option<DateTime<Utc>>,
    pub ip: String,
    pub selected_ssid: Option<String>,
    pub selected_channel: Option<u32>,
}

impl DeviceState {
    /// Map a raw device document.
    ///
    /// With a heartbeat, the device is online when the heartbeat is at most
    /// `threshold` old, unless the document explicitly says `online: false`.
    /// Without one, the document's own `online` flag is kept.
    pub fn from_raw(
        id: impl Into<String>,
        raw: Option<&Value>,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Self {
        let field = |name: &str| raw.and_then(|r| r.get(name));
        let text = |name: &str| field(name).and_then(Value::as_str).map(str::to_string);

        let reported_online = field("online").and_then(Value::as_bool);
        let last_seen = field("lastSeen").and_then(parse_last_seen);

        let online = match last_seen {
            Some(seen) => Some(now - seen <= threshold && reported_online != Some(false)),
            None => reported_online,
        };

        Self {
            id: id.into(),
            name: text("name"),
            bssid: text("bssid"),
            online,
            last_seen,
            ip: text("ip").unwrap_or_default(),
            selected_ssid: text("selectedSsid"),
            selected_channel: field("selectedChannel")
                .and_then(Value::as_u64)
                .and_then(|c| u32::try_from(c).ok()),
        }
    }

    /// `Online`, `Offline` or `Ukendt`.
    pub fn online_label(&self) -> &'static str {
        online_label(self.online)
    }
}

/// Display label for a tri-state online flag.
pub fn online_label(online: Option<bool>) -> &'static str {
    match online {
        Some(true) => "Online",
        Some(false) => "Offline",
        None => "Ukendt",
    }
}

/// Parse a heartbeat timestamp.
///
/// Accepts a `{seconds, nanoseconds}` timestamp object, epoch milliseconds as
/// a number or numeric string, or an RFC 3339 string.
pub fn parse_last_seen(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(ts) => {
            let seconds = ts.get("seconds")?.as_f64()?;
            let nanos = ts
                .get("nanoseconds")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(seconds as i64, nanos)
        }
        Value::Number(n) => from_millis(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse::<f64>() {
                Ok(ms) => from_millis(ms),
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            }
        }
        _ => None,
    }
}

fn from_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

/// A device with the location of the access point it reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedDevice {
    #[serde(flatten)]
    pub device: DeviceState,
    pub resolved: Option<ResolvedLocation>,
}

/// Resolve each device's BSSID against the access point cache.
pub fn locate_devices(devices: Vec<DeviceState>, cache: &AccessPointCache) -> Vec<LocatedDevice> {
    devices
        .into_iter()
        .map(|device| LocatedDevice {
            resolved: cache.resolve(device.bssid.as_deref()),
            device,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AccessPointRecord;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn threshold() -> Duration {
        Duration::milliseconds(DEFAULT_OFFLINE_THRESHOLD_MS)
    }

    fn state(raw: Value) -> DeviceState {
        DeviceState::from_raw("m5", Some(&raw), now(), threshold())
    }

    fn millis_ago(ms: i64) -> i64 {
        (now() - Duration::milliseconds(ms)).timestamp_millis()
    }

    #[test]
    fn fresh_heartbeat_is_online() {
        let device = state(json!({"lastSeen": millis_ago(2_000)}));
        assert_eq!(device.online, Some(true));
        assert_eq!(device.online_label(), "Online");
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(state(json!({"lastSeen": millis_ago(6_000)})).online, Some(true));
        assert_eq!(state(json!({"lastSeen": millis_ago(6_001)})).online, Some(false));
    }

    #[test]
    fn stale_heartbeat_overrides_flag() {
        let device = state(json!({"online": true, "lastSeen": millis_ago(60_000)}));
        assert_eq!(device.online, Some(false));
    }

    #[test]
    fn explicit_offline_wins() {
        let device = state(json!({"online": false, "lastSeen": millis_ago(1_000)}));
        assert_eq!(device.online, Some(false));
    }

    #[test]
    fn no_heartbeat_keeps_flag() {
        assert_eq!(state(json!({"online": true})).online, Some(true));
        assert_eq!(state(json!({"online": "yes"})).online, None);
        assert_eq!(state(json!({})).online_label(), "Ukendt");

        let missing = DeviceState::from_raw("m5", None, now(), threshold());
        assert_eq!(missing.online, None);
        assert_eq!(missing.ip, "");
    }

    #[test]
    fn lenient_fields() {
        let device = state(json!({
            "name": "Tracker 1",
            "bssid": 42,
            "ip": "10.0.0.7",
            "selectedSsid": ["x"],
            "selectedChannel": 6
        }));
        assert_eq!(device.name.as_deref(), Some("Tracker 1"));
        assert_eq!(device.bssid, None);
        assert_eq!(device.ip, "10.0.0.7");
        assert_eq!(device.selected_ssid, None);
        assert_eq!(device.selected_channel, Some(6));

        assert_eq!(state(json!({"selectedChannel": "6"})).selected_channel, None);
    }

    #[test]
    fn last_seen_formats() {
        let expected = now();
        let secs = expected.timestamp();
        let ms = expected.timestamp_millis();

        assert_eq!(parse_last_seen(&json!({"seconds": secs, "nanoseconds": 0})), Some(expected));
        assert_eq!(parse_last_seen(&json!(ms)), Some(expected));
        assert_eq!(parse_last_seen(&json!(ms.to_string())), Some(expected));
        assert_eq!(parse_last_seen(&json!("2024-05-01T14:00:00+02:00")), Some(expected));
        assert_eq!(parse_last_seen(&json!(0)), DateTime::from_timestamp(0, 0));
    }

    #[test]
    fn last_seen_rejects_garbage() {
        assert_eq!(parse_last_seen(&json!(null)), None);
        assert_eq!(parse_last_seen(&json!("")), None);
        assert_eq!(parse_last_seen(&json!("yesterday")), None);
        assert_eq!(parse_last_seen(&json!(true)), None);
        assert_eq!(parse_last_seen(&json!({"nanoseconds": 5})), None);
    }

    #[test]
    fn locate_by_bssid() {
        let cache = AccessPointCache::default();
        cache.rebuild(&[AccessPointRecord::new("AP-1", "aa:bb:cc", "4109 Akut")]);

        let devices = vec![
            state(json!({"bssid": "AA:BB:CC "})),
            state(json!({"bssid": "dd:ee:ff"})),
            state(json!({})),
        ];
        let located = locate_devices(devices, &cache);

        assert_eq!(located[0].resolved.as_ref().unwrap().opgang, "41");
        assert!(located[1].resolved.is_none());
        assert!(located[2].resolved.is_none());
    }

    #[test]
    fn located_device_flattens() {
        let cache = AccessPointCache::default();
        let located = locate_devices(vec![state(json!({"ip": "10.0.0.1"}))], &cache);
        let json = serde_json::to_value(&located[0]).unwrap();
        assert_eq!(json["id"], "m5");
        assert_eq!(json["ip"], "10.0.0.1");
        assert_eq!(json["resolved"], Value::Null);
    }
}
