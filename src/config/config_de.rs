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

use std::time::Duration;

use serde::{Deserializer, de::{self, Visitor}};

pub fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where D: Deserializer<'de>
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("duration as number of seconds, or string with time unit suffix [ms,s,m,h]")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where E: de::Error
        {
            // "ms" must be checked before "m" and "s"
            let val = if let Some(v) = v.strip_suffix("ms") {
                Duration::from_millis(v.parse().map_err(E::custom)?)
            } else if let Some(v) = v.strip_suffix("s") {
                Duration::from_secs(v.parse().map_err(E::custom)?)
            } else if let Some(v) = v.strip_suffix("m") {
                Duration::from_mins(v.parse().map_err(E::custom)?)
            } else if let Some(v) = v.strip_suffix("h") {
                Duration::from_hours(v.parse().map_err(E::custom)?)
            } else {
                return Err(E::custom("Duration suffix must be one of [ms,s,m,h]"));
            };

            Ok(val)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where E: de::Error
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where E: de::Error
        {
            let secs = u64::try_from(v).map_err(E::custom)?;
            Ok(Duration::from_secs(secs))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "super::duration")]
        value: Duration
    }

    fn parse(src: &str) -> Result<Duration, toml::de::Error> {
        toml::from_str::<Wrapper>(src).map(|w| w.value)
    }

    #[test]
    fn units() {
        assert_eq!(parse("value = \"150ms\"").unwrap(), Duration::from_millis(150));
        assert_eq!(parse("value = \"3s\"").unwrap(), Duration::from_secs(3));
        assert_eq!(parse("value = \"2m\"").unwrap(), Duration::from_secs(120));
        assert_eq!(parse("value = \"1h\"").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse("value = 7").unwrap(), Duration::from_secs(7));
    }

    #[test]
    fn bad_suffix() {
        assert!(parse("value = \"5d\"").is_err());
        assert!(parse("value = -1").is_err());
    }
}
