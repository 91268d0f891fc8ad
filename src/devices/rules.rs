//! Static device rules and access flags.

use std::fmt;
use std::ops::BitOr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::SysimageConfig;

/// Access flag set for a device, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access(u8);

impl Access {
    pub const READABLE: Access = Access(1);
    pub const WRITABLE: Access = Access(1 << 1);
    pub const RANDOM: Access = Access(1 << 2);
    pub const SEQUENTIAL: Access = Access(1 << 3);
    pub const CDR: Access = Access(1 << 4);
    pub const NETWORK: Access = Access(1 << 5);

    pub fn contains(self, flags: Access) -> bool {
        self.0 & flags.0 == flags.0
    }

    pub fn is_readable(self) -> bool {
        self.contains(Self::READABLE)
    }

    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    pub fn is_network(self) -> bool {
        self.contains(Self::NETWORK)
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access(self.0 | rhs.0)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Access, &str); 6] = [
            (Access::READABLE, "readable"),
            (Access::WRITABLE, "writable"),
            (Access::RANDOM, "random"),
            (Access::SEQUENTIAL, "sequential"),
            (Access::CDR, "cdr"),
            (Access::NETWORK, "network"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, "+")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Serialize for Access {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Path requirement for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// Path must be present.
    Required,
    /// Path must be present unless the device is the node's payload device.
    RequiredOrPayload,
    /// Path may be omitted.
    Optional,
    /// Path must not be given; it is injected from configuration.
    Forbidden,
}

/// Legality knowledge for one device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRule {
    pub access: Access,
    pub path: PathPolicy,
    pub wildcard_allowed: bool,
}

/// Known device roles plus configured system-image devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    Stdin,
    Stdout,
    Stderr,
    Input,
    Output,
    Image,
    Debug,
    Script,
    /// Externally configured system-image device, by its configured name.
    SystemImage(String),
}

impl DeviceKind {
    /// Classify a device name against the fixed set and the configured
    /// system-image allow-list. `None` means the name is illegal.
    pub fn classify(name: &str, sysimages: &SysimageConfig) -> Option<DeviceKind> {
        match name {
            "stdin" => Some(DeviceKind::Stdin),
            "stdout" => Some(DeviceKind::Stdout),
            "stderr" => Some(DeviceKind::Stderr),
            "input" => Some(DeviceKind::Input),
            "output" => Some(DeviceKind::Output),
            "image" => Some(DeviceKind::Image),
            "debug" => Some(DeviceKind::Debug),
            "script" => Some(DeviceKind::Script),
            other if sysimages.contains(other) => {
                Some(DeviceKind::SystemImage(other.to_string()))
            }
            _ => None,
        }
    }

    pub fn rule(&self) -> DeviceRule {
        match self {
            DeviceKind::Stdin => DeviceRule {
                access: Access::READABLE | Access::SEQUENTIAL,
                path: PathPolicy::RequiredOrPayload,
                wildcard_allowed: true,
            },
            DeviceKind::Stdout => DeviceRule {
                access: Access::WRITABLE | Access::SEQUENTIAL,
                path: PathPolicy::Optional,
                wildcard_allowed: true,
            },
            DeviceKind::Stderr => DeviceRule {
                access: Access::WRITABLE | Access::SEQUENTIAL,
                path: PathPolicy::Optional,
                wildcard_allowed: true,
            },
            DeviceKind::Input => DeviceRule {
                access: Access::READABLE | Access::RANDOM,
                path: PathPolicy::RequiredOrPayload,
                wildcard_allowed: true,
            },
            DeviceKind::Output => DeviceRule {
                access: Access::WRITABLE | Access::RANDOM,
                path: PathPolicy::Optional,
                wildcard_allowed: true,
            },
            DeviceKind::Image => DeviceRule {
                access: Access::READABLE | Access::RANDOM | Access::CDR,
                path: PathPolicy::Required,
                wildcard_allowed: false,
            },
            DeviceKind::Debug => DeviceRule {
                access: Access::WRITABLE | Access::NETWORK,
                path: PathPolicy::Required,
                wildcard_allowed: false,
            },
            DeviceKind::Script => DeviceRule {
                access: Access::READABLE | Access::SEQUENTIAL,
                path: PathPolicy::RequiredOrPayload,
                wildcard_allowed: true,
            },
            DeviceKind::SystemImage(_) => DeviceRule {
                access: Access::READABLE | Access::RANDOM,
                path: PathPolicy::Forbidden,
                wildcard_allowed: false,
            },
        }
    }

    /// Whether the device may stand in for the request payload when it has
    /// no path. Only stdin, input and script qualify, one per node.
    pub fn payload_eligible(&self) -> bool {
        matches!(
            self,
            DeviceKind::Stdin | DeviceKind::Input | DeviceKind::Script
        )
    }
}

static DEBUG_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(tcp|udp)://[A-Za-z0-9.-]+:[0-9]+$").expect("static pattern")
});

/// Check the `debug` device path form: `proto://host:port` with proto tcp
/// or udp, numeric port, hostname restricted to alphanumerics, `.`, `-`.
pub fn validate_debug_url(path: &str) -> Result<(), String> {
    if DEBUG_URL.is_match(path) {
        Ok(())
    } else {
        Err(format!(
            "debug path must be tcp://host:port or udp://host:port, got '{path}'"
        ))
    }
}
