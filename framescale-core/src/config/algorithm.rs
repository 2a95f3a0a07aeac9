//! Scaling algorithm and failure policy enums.
//!
//! Both are parsed from the configuration file by name. Algorithm names are
//! matched case-insensitively and rendered back in the canonical spelling the
//! image resizer expects.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Pixel-art and classic scaling algorithms understood by the image resizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ScaleAlgorithm {
    Xbr,
    Xbrz,
    Hqx,
    Lqx,
    Eagle,
    Sai,
    Scale,
    NearestNeighbor,
    Bilinear,
    Bicubic,
    Lanczos,
}

impl ScaleAlgorithm {
    pub const ALL: [ScaleAlgorithm; 11] = [
        ScaleAlgorithm::Xbr,
        ScaleAlgorithm::Xbrz,
        ScaleAlgorithm::Hqx,
        ScaleAlgorithm::Lqx,
        ScaleAlgorithm::Eagle,
        ScaleAlgorithm::Sai,
        ScaleAlgorithm::Scale,
        ScaleAlgorithm::NearestNeighbor,
        ScaleAlgorithm::Bilinear,
        ScaleAlgorithm::Bicubic,
        ScaleAlgorithm::Lanczos,
    ];

    /// Canonical name, as written in the config file and passed to the resizer.
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleAlgorithm::Xbr => "XBR",
            ScaleAlgorithm::Xbrz => "XBRz",
            ScaleAlgorithm::Hqx => "HQX",
            ScaleAlgorithm::Lqx => "LQX",
            ScaleAlgorithm::Eagle => "Eagle",
            ScaleAlgorithm::Sai => "SaI",
            ScaleAlgorithm::Scale => "Scale",
            ScaleAlgorithm::NearestNeighbor => "NearestNeighbor",
            ScaleAlgorithm::Bilinear => "Bilinear",
            ScaleAlgorithm::Bicubic => "Bicubic",
            ScaleAlgorithm::Lanczos => "Lanczos",
        }
    }

    fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ScaleAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unsupported algorithm '{wanted}' (supported: {})",
                    Self::supported_names()
                )
            })
    }
}

impl TryFrom<String> for ScaleAlgorithm {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the upscale stage does when a frame fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum FailurePolicy {
    /// Abort on the first failing frame.
    #[default]
    FailFast,
    /// Attempt every frame, then report all failures together.
    BestEffort,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail-fast",
            FailurePolicy::BestEffort => "best-effort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-fast" => Ok(FailurePolicy::FailFast),
            "best-effort" => Ok(FailurePolicy::BestEffort),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'fail-fast' or 'best-effort')"
            )),
        }
    }
}

impl TryFrom<String> for FailurePolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parse_is_case_insensitive() {
        assert_eq!("xbr".parse::<ScaleAlgorithm>(), Ok(ScaleAlgorithm::Xbr));
        assert_eq!("HQX".parse::<ScaleAlgorithm>(), Ok(ScaleAlgorithm::Hqx));
        assert_eq!(
            "nearestneighbor".parse::<ScaleAlgorithm>(),
            Ok(ScaleAlgorithm::NearestNeighbor)
        );
    }

    #[test]
    fn test_algorithm_rejects_unknown_name() {
        let err = "Foobar".parse::<ScaleAlgorithm>().unwrap_err();
        assert!(err.contains("Foobar"));
        assert!(err.contains("XBR"));
    }

    #[test]
    fn test_failure_policy_accepts_underscores() {
        assert_eq!(
            "best_effort".parse::<FailurePolicy>(),
            Ok(FailurePolicy::BestEffort)
        );
        assert_eq!("Fail-Fast".parse::<FailurePolicy>(), Ok(FailurePolicy::FailFast));
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }
}
