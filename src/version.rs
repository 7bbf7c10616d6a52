use ash::vk;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A Vulkan `major.minor.patch` triple. The variant component of the packed
/// form is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const V1_0_0: Version = Version::new(1, 0, 0);
    pub const V1_1_0: Version = Version::new(1, 1, 0);
    pub const V1_2_0: Version = Version::new(1, 2, 0);
    pub const V1_3_0: Version = Version::new(1, 3, 0);
    pub const V1_4_0: Version = Version::new(1, 4, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V1_0_0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<u32> for Version {
    fn from(version: u32) -> Self {
        Self {
            major: vk::api_version_major(version),
            minor: vk::api_version_minor(version),
            patch: vk::api_version_patch(version),
        }
    }
}

impl From<Version> for u32 {
    fn from(version: Version) -> Self {
        vk::make_api_version(0, version.major, version.minor, version.patch)
    }
}

const MAX_MAJOR: u32 = 0x7f;
const MAX_MINOR: u32 = 0x3ff;
const MAX_PATCH: u32 = 0xfff;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version string {0:?}, expected \"major.minor\" or \"major.minor.patch\"")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());
        let parts = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        let version = match parts.as_slice() {
            [major, minor] => Self::new(*major, *minor, 0),
            [major, minor, patch] => Self::new(*major, *minor, *patch),
            _ => return Err(invalid()),
        };

        // Anything wider would bleed into the neighbouring field once packed.
        if version.major > MAX_MAJOR || version.minor > MAX_MINOR || version.patch > MAX_PATCH {
            return Err(invalid());
        }

        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
