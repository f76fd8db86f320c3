/*
 * ReLight - Write-ordering bridge for Yeelight ceiling lamps
 * Copyright (C) 2026 Josh Kropf <josh@slashdev.ca>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant}
};

use anyhow::{Result, anyhow};
use log::debug;
use serde_json::{Map, Value};

use crate::device::PropertySource;

/// Property names fetched from the lamp, in request order
pub const PROP_NAMES: [&str; 6] = ["power", "bright", "nl_br", "ct", "color_mode", "active_mode"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Ct,
    Hsv
}

impl TryFrom<u32> for ColorMode {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            1 => Self::Rgb,
            2 => Self::Ct,
            3 => Self::Hsv,
            v => return Err(anyhow!("Unsupported color mode {v}"))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMode {
    Normal,
    Night
}

impl TryFrom<u32> for ActiveMode {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            0 => Self::Normal,
            1 => Self::Night,
            v => return Err(anyhow!("Unsupported active mode {v}"))
        })
    }
}

/// Last known lamp state. Only one of `bright`/`nl_br` is live at a time
/// (selected by `active_mode`), the other keeps the last value used in the
/// inactive mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub power: bool,
    pub bright: u8,
    pub nl_br: u8,
    /// Color temperature in kelvin
    pub ct: u32,
    pub color_mode: ColorMode,
    pub active_mode: ActiveMode
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            power: false,
            bright: 100,
            nl_br: 1,
            ct: 4000,
            color_mode: ColorMode::Ct,
            active_mode: ActiveMode::Normal
        }
    }
}

impl Attributes {
    pub fn merge(&mut self, patch: &AttributesPatch) {
        if let Some(power) = patch.power {
            self.power = power;
        }
        if let Some(bright) = patch.bright {
            self.bright = bright;
        }
        if let Some(nl_br) = patch.nl_br {
            self.nl_br = nl_br;
        }
        if let Some(ct) = patch.ct {
            self.ct = ct;
        }
        if let Some(color_mode) = patch.color_mode {
            self.color_mode = color_mode;
        }
        if let Some(active_mode) = patch.active_mode {
            self.active_mode = active_mode;
        }
    }
}

/// Partial attribute update; `None` fields are left untouched on merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributesPatch {
    pub power: Option<bool>,
    pub bright: Option<u8>,
    pub nl_br: Option<u8>,
    pub ct: Option<u32>,
    pub color_mode: Option<ColorMode>,
    pub active_mode: Option<ActiveMode>
}

impl AttributesPatch {
    /// Build a patch from a `props` map as pushed (or returned) by the lamp.
    /// The lamp reports most values as strings, but numbers are accepted too.
    /// Unknown keys and unparsable values are skipped.
    pub fn from_props(props: &Map<String, Value>) -> Self {
        let mut patch = Self::default();

        for (name, value) in props {
            match name.as_str() {
                "power" => patch.power = value.as_str().map(|s| s == "on"),
                "bright" => patch.bright = prop_u32(value).and_then(|v| u8::try_from(v).ok()),
                "nl_br" => patch.nl_br = prop_u32(value).and_then(|v| u8::try_from(v).ok()),
                "ct" => patch.ct = prop_u32(value),
                "color_mode" => patch.color_mode = prop_u32(value).and_then(|v| v.try_into().ok()),
                "active_mode" => patch.active_mode = prop_u32(value).and_then(|v| v.try_into().ok()),
                _ => debug!("Ignore prop {name}={value}")
            }
        }

        patch
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn prop_u32(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None
    }
}

/// Read/write-through cache of lamp attributes
pub trait AttributeStore {
    /// Current attributes. May query the lamp when the cache is stale.
    fn attributes(&self) -> Result<Attributes>;

    /// Merge `patch` into the cache without any device I/O. Returns the
    /// merged attributes.
    fn set_attributes(&self, patch: AttributesPatch) -> Attributes;
}

struct CacheEntry {
    attributes: Attributes,
    fetched_at: Option<Instant>
}

pub struct AttributeCache<P> {
    source: Arc<P>,
    max_age: Duration,
    entry: Mutex<CacheEntry>
}

impl<P: PropertySource> AttributeCache<P> {
    pub fn new(source: Arc<P>, max_age: Duration) -> Self {
        Self {
            source,
            max_age,
            entry: Mutex::new(CacheEntry {
                attributes: Attributes::default(),
                fetched_at: None
            })
        }
    }

    fn entry(&self) -> MutexGuard<'_, CacheEntry> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(&self) -> Result<Attributes> {
        let values = self.source.get_props(&PROP_NAMES)?;
        if values.len() != PROP_NAMES.len() {
            return Err(anyhow!("get_prop returned {} values, expected {}", values.len(), PROP_NAMES.len()));
        }

        let props: Map<String, Value> = PROP_NAMES.iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), Value::String(value)))
            .collect();

        let mut attributes = Attributes::default();
        attributes.merge(&AttributesPatch::from_props(&props));
        Ok(attributes)
    }
}

impl<P: PropertySource> AttributeStore for AttributeCache<P> {
    fn attributes(&self) -> Result<Attributes> {
        {
            let entry = self.entry();
            if let Some(fetched_at) = entry.fetched_at && fetched_at.elapsed() < self.max_age {
                return Ok(entry.attributes.clone());
            }
        }

        debug!("Attribute cache stale, fetching from device");
        let attributes = self.fetch()?;

        let mut entry = self.entry();
        entry.attributes = attributes.clone();
        entry.fetched_at = Some(Instant::now());

        Ok(attributes)
    }

    fn set_attributes(&self, patch: AttributesPatch) -> Attributes {
        let mut entry = self.entry();
        entry.attributes.merge(&patch);
        entry.attributes.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct FixedProps(Vec<&'static str>, AtomicUsize);

    impl FixedProps {
        fn new(values: Vec<&'static str>) -> Self {
            Self(values, AtomicUsize::new(0))
        }

        fn fetches(&self) -> usize {
            self.1.load(Ordering::SeqCst)
        }
    }

    impl PropertySource for FixedProps {
        fn get_props(&self, names: &[&str]) -> Result<Vec<String>> {
            assert_eq!(names, &PROP_NAMES);
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn patch_from_string_and_number_props() {
        let props = json!({
            "power": "on",
            "bright": "42",
            "nl_br": 7,
            "ct": "2700",
            "color_mode": "2",
            "active_mode": 1,
            "rgb": "16711680"
        });

        let patch = AttributesPatch::from_props(props.as_object().unwrap());
        assert_eq!(patch, AttributesPatch {
            power: Some(true),
            bright: Some(42),
            nl_br: Some(7),
            ct: Some(2700),
            color_mode: Some(ColorMode::Ct),
            active_mode: Some(ActiveMode::Night)
        });
    }

    #[test]
    fn patch_skips_bad_values() {
        let props = json!({ "bright": "lots", "color_mode": "9" });
        let patch = AttributesPatch::from_props(props.as_object().unwrap());
        assert!(patch.is_empty());
    }

    #[test]
    fn merge_only_touches_set_fields() {
        let mut attributes = Attributes::default();
        attributes.merge(&AttributesPatch { nl_br: Some(59), ..Default::default() });

        assert_eq!(attributes.nl_br, 59);
        assert_eq!(attributes.bright, Attributes::default().bright);
        assert_eq!(attributes.power, false);
    }

    #[test]
    fn cache_fetches_then_keeps_local_writes() {
        let source = Arc::new(FixedProps::new(vec!["on", "80", "10", "3000", "2", "0"]));
        let cache = AttributeCache::new(source, Duration::from_secs(60));

        let attributes = cache.attributes().unwrap();
        assert!(attributes.power);
        assert_eq!(attributes.bright, 80);
        assert_eq!(attributes.ct, 3000);
        assert_eq!(attributes.active_mode, ActiveMode::Normal);

        cache.set_attributes(AttributesPatch { bright: Some(60), ..Default::default() });
        assert_eq!(cache.attributes().unwrap().bright, 60);
    }

    #[test]
    fn stale_cache_refetches() {
        let source = Arc::new(FixedProps::new(vec!["off", "80", "10", "3000", "2", "0"]));
        let cache = AttributeCache::new(source, Duration::ZERO);

        cache.set_attributes(AttributesPatch { power: Some(true), ..Default::default() });
        assert_eq!(cache.attributes().unwrap().power, false);
    }

    #[test]
    fn merging_a_patch_never_fetches() {
        let source = Arc::new(FixedProps::new(vec!["on", "80", "10", "3000", "2", "0"]));
        let cache = AttributeCache::new(Arc::clone(&source), Duration::ZERO);
        cache.attributes().unwrap();
        assert_eq!(source.fetches(), 1);

        let merged = cache.set_attributes(AttributesPatch { bright: Some(20), ..Default::default() });
        assert_eq!(merged.bright, 20);
        assert_eq!(merged.ct, 3000);
        assert_eq!(source.fetches(), 1);
    }

    #[test]
    fn short_get_prop_reply_is_error() {
        let source = Arc::new(FixedProps::new(vec!["on"]));
        let cache = AttributeCache::new(source, Duration::from_secs(60));
        assert!(cache.attributes().is_err());
    }
}
