use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RepoSizeError;

const K: u64 = 1024;

/// Unit used to render byte counts. `Auto` picks the largest fitting unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SizeMeasure {
    #[default]
    Auto,
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
    EB,
    ZB,
    YB,
}

impl SizeMeasure {
    pub const ALL: [SizeMeasure; 10] = [
        SizeMeasure::Auto,
        SizeMeasure::B,
        SizeMeasure::KB,
        SizeMeasure::MB,
        SizeMeasure::GB,
        SizeMeasure::TB,
        SizeMeasure::PB,
        SizeMeasure::EB,
        SizeMeasure::ZB,
        SizeMeasure::YB,
    ];

    /// Position in the selector, `Auto` first.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeMeasure::Auto => "AUTO",
            SizeMeasure::B => "B",
            SizeMeasure::KB => "KB",
            SizeMeasure::MB => "MB",
            SizeMeasure::GB => "GB",
            SizeMeasure::TB => "TB",
            SizeMeasure::PB => "PB",
            SizeMeasure::EB => "EB",
            SizeMeasure::ZB => "ZB",
            SizeMeasure::YB => "YB",
        }
    }
}

impl fmt::Display for SizeMeasure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeMeasure {
    type Err = RepoSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        SizeMeasure::ALL
            .into_iter()
            .find(|m| m.label() == wanted)
            .ok_or_else(|| RepoSizeError::Config(format!("unknown size unit: {}", s)))
    }
}

impl TryFrom<String> for SizeMeasure {
    type Error = RepoSizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SizeMeasure> for String {
    fn from(m: SizeMeasure) -> Self {
        m.label().to_string()
    }
}

/// Presentation settings threaded through formatting and injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderConfig {
    pub unit: SizeMeasure,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HumanSize {
    pub value: f64,
    pub unit: &'static str,
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Largest `k` with `1024^k <= bytes`, capped at the largest unit.
fn auto_exponent(bytes: u64) -> u32 {
    let mut k = 0;
    let mut rest = bytes;
    while rest >= K && k < 8 {
        rest /= K;
        k += 1;
    }
    k
}

pub fn humanize(bytes: u64, unit: SizeMeasure) -> HumanSize {
    if bytes == 0 {
        return HumanSize {
            value: 0.0,
            unit: "Bytes",
        };
    }

    let (exponent, measure) = match unit {
        SizeMeasure::Auto => {
            let k = auto_exponent(bytes);
            (k, SizeMeasure::ALL[k as usize + 1])
        }
        explicit => ((explicit.index() - 1) as u32, explicit),
    };

    HumanSize {
        value: round2(bytes as f64 / (K as f64).powi(exponent as i32)),
        unit: measure.label(),
    }
}

/// Cell text for an optional size; empty when the size is unknown or zero.
pub fn size_label(bytes: Option<u64>, config: &RenderConfig) -> String {
    match bytes {
        Some(0) | None => String::new(),
        Some(bytes) => humanize(bytes, config.unit).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_bytes_for_every_unit() {
        for unit in SizeMeasure::ALL {
            let h = humanize(0, unit);
            assert_eq!(h.value, 0.0);
            assert_eq!(h.unit, "Bytes");
        }
    }

    #[test]
    fn auto_picks_largest_unit() {
        assert_eq!(humanize(1536, SizeMeasure::Auto), HumanSize { value: 1.5, unit: "KB" });
        assert_eq!(
            humanize(5 * 1024 * 1024 * 1024, SizeMeasure::Auto),
            HumanSize { value: 5.0, unit: "GB" }
        );
        assert_eq!(humanize(1023, SizeMeasure::Auto).unit, "B");
        assert_eq!(humanize(1024, SizeMeasure::Auto), HumanSize { value: 1.0, unit: "KB" });
        assert_eq!(humanize(u64::MAX, SizeMeasure::Auto).unit, "EB");
    }

    #[test]
    fn auto_value_scales_back_within_rounding() {
        for bytes in [1u64, 999, 4097, 123_456, 98_765_432, 7_000_000_000_000] {
            let h = humanize(bytes, SizeMeasure::Auto);
            let k = auto_exponent(bytes) as i32;
            let back = h.value * 1024f64.powi(k);
            assert!((back - bytes as f64).abs() <= 0.005 * 1024f64.powi(k));
        }
    }

    #[test]
    fn explicit_unit_scales_unconditionally() {
        assert_eq!(humanize(512, SizeMeasure::KB), HumanSize { value: 0.5, unit: "KB" });
        assert_eq!(humanize(3 * 1024 * 1024, SizeMeasure::KB).value, 3072.0);
        assert_eq!(humanize(1536, SizeMeasure::B).value, 1536.0);
        assert_eq!(humanize(1, SizeMeasure::MB).value, 0.0);
        assert_eq!(humanize(2 * 1024 * 1024 * 1024, SizeMeasure::GB).unit, "GB");
    }

    #[test]
    fn display_drops_trailing_zeros() {
        assert_eq!(humanize(1536, SizeMeasure::Auto).to_string(), "1.5 KB");
        assert_eq!(humanize(2048, SizeMeasure::Auto).to_string(), "2 KB");
        assert_eq!(humanize(0, SizeMeasure::Auto).to_string(), "0 Bytes");
        assert_eq!(humanize(1000, SizeMeasure::KB).to_string(), "0.98 KB");
    }

    #[test]
    fn size_label_is_empty_for_unknown() {
        let config = RenderConfig::default();
        assert_eq!(size_label(None, &config), "");
        assert_eq!(size_label(Some(0), &config), "");
        assert_eq!(size_label(Some(10), &config), "10 B");
        let kb = RenderConfig { unit: SizeMeasure::KB };
        assert_eq!(size_label(Some(10), &kb), "0.01 KB");
    }

    #[test]
    fn measure_parses_labels() {
        assert_eq!("auto".parse::<SizeMeasure>().unwrap(), SizeMeasure::Auto);
        assert_eq!("Mb".parse::<SizeMeasure>().unwrap(), SizeMeasure::MB);
        assert!("bytes".parse::<SizeMeasure>().is_err());
        assert_eq!(SizeMeasure::YB.index(), 9);
    }
}
