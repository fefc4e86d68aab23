use crate::weak_error;
use once_cell::sync;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Runtime SemVer version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub (u32, u32, u32));

impl Version {
    /// Parse runtime version from strings like "v2.13.4", "2.13.4" or "v2.13.4-dev.1".
    pub fn parse(s: &str) -> Option<Self> {
        static V_RE: sync::Lazy<Regex> = sync::Lazy::new(|| {
            Regex::new(r"^\s*v?(\d+)\.(\d+)\.(\d+)").expect("must compile")
        });

        if let Some((_, [major, minor, patch])) = V_RE.captures(s).map(|c| c.extract()) {
            let major = weak_error!(major.parse::<u32>())?;
            let minor = weak_error!(minor.parse::<u32>())?;
            let patch = weak_error!(patch.parse::<u32>())?;
            return Some(Version((major, minor, patch)));
        }
        None
    }

    pub fn major(&self) -> u32 {
        self.0 .0
    }

    pub fn minor(&self) -> u32 {
        self.0 .1
    }

    /// Two versions speak the same protocol if their major and minor numbers match,
    /// patch releases never break it.
    pub fn is_protocol_compatible(&self, other: &Version) -> bool {
        self.major() == other.major() && self.minor() == other.minor()
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.0;
        write!(f, "v{major}.{minor}.{patch}")
    }
}
