//! Assignable adapter records.
//!
//! One [`AssignableAdapters`] record exists per hardware model. It lists the
//! I/O bundles (network ports, USB controllers, serial ports, ...) that may be
//! handed to guest workloads on devices of that model.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::topic::Topic;

/// Kind of I/O adapter in a bundle.
///
/// Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IoType {
    #[default]
    Nop,
    Eth,
    Usb,
    Com,
    Hdmi,
    Audio,
    Other,
}

impl IoType {
    /// Integer code used on the wire.
    pub fn code(self) -> u8 {
        match self {
            IoType::Nop => 0,
            IoType::Eth => 1,
            IoType::Usb => 2,
            IoType::Com => 3,
            IoType::Hdmi => 4,
            IoType::Audio => 5,
            IoType::Other => 255,
        }
    }
}

impl TryFrom<u8> for IoType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(IoType::Nop),
            1 => Ok(IoType::Eth),
            2 => Ok(IoType::Usb),
            3 => Ok(IoType::Com),
            4 => Ok(IoType::Hdmi),
            5 => Ok(IoType::Audio),
            255 => Ok(IoType::Other),
            other => Err(Error::UnknownIoType(other)),
        }
    }
}

impl From<IoType> for u8 {
    fn from(io_type: IoType) -> Self {
        io_type.code()
    }
}

/// A group of adapters that must be assigned together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IoBundle {
    /// Adapter kind.
    #[serde(rename = "Type")]
    pub io_type: IoType,

    /// Short name, e.g. "eth0-1" or "COM1".
    pub name: String,

    /// Individual members of the bundle, e.g. "eth0" and "eth1".
    #[serde(default)]
    pub members: Vec<String>,

    /// Whether the PCI identity must be looked up from the member names.
    #[serde(default)]
    pub lookup: bool,

    /// Short PCI identifier (bus:slot.func).
    #[serde(default)]
    pub pci_short: String,

    /// Long PCI identifier (domain:bus:slot.func).
    #[serde(default)]
    pub pci_long: String,

    /// Workload currently holding the bundle, if any.
    #[serde(default, rename = "UsedByUUID", skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
}

impl IoBundle {
    /// Create a bundle with the given type and name.
    pub fn new(io_type: IoType, name: impl Into<String>) -> Self {
        Self {
            io_type,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add members to the bundle.
    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.extend(members.into_iter().map(Into::into));
        self
    }

    /// Set the PCI identifiers.
    pub fn with_pci(mut self, short: impl Into<String>, long: impl Into<String>) -> Self {
        self.pci_short = short.into();
        self.pci_long = long.into();
        self
    }

    /// Require a PCI lookup for this bundle.
    pub fn with_lookup(mut self) -> Self {
        self.lookup = true;
        self
    }

    /// Whether the bundle is currently assigned to a workload.
    pub fn is_used(&self) -> bool {
        self.used_by.is_some()
    }
}

/// The assignable adapters of one hardware model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssignableAdapters {
    /// Hardware model this record applies to.
    pub model: String,

    /// Adapter bundles available on the model.
    #[serde(default)]
    pub io_bundle_list: Vec<IoBundle>,
}

impl AssignableAdapters {
    /// Create an empty record for a model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            io_bundle_list: Vec::new(),
        }
    }

    /// Add a bundle.
    pub fn with_bundle(mut self, bundle: IoBundle) -> Self {
        self.io_bundle_list.push(bundle);
        self
    }

    /// Find a bundle by type and name. Names compare case-insensitively.
    pub fn lookup_io_bundle(&self, io_type: IoType, name: &str) -> Option<&IoBundle> {
        self.io_bundle_list
            .iter()
            .find(|b| b.io_type == io_type && b.name.eq_ignore_ascii_case(name))
    }

    /// Find the bundle of the given type that contains `member`.
    pub fn lookup_io_bundle_for_member(&self, io_type: IoType, member: &str) -> Option<&IoBundle> {
        self.io_bundle_list.iter().find(|b| {
            b.io_type == io_type && b.members.iter().any(|m| m.eq_ignore_ascii_case(member))
        })
    }

    /// Iterate over the bundles of one type.
    pub fn bundles_of_type(&self, io_type: IoType) -> impl Iterator<Item = &IoBundle> {
        self.io_bundle_list
            .iter()
            .filter(move |b| b.io_type == io_type)
    }
}

impl Topic for AssignableAdapters {
    const TOPIC: &'static str = "AssignableAdapters";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssignableAdapters {
        AssignableAdapters::new("Supermicro.SYS-E100-9APP")
            .with_bundle(
                IoBundle::new(IoType::Eth, "eth0-1")
                    .with_members(["eth0", "eth1"])
                    .with_pci("01:00.0", "0000:01:00.0"),
            )
            .with_bundle(IoBundle::new(IoType::Com, "COM1").with_members(["COM1"]))
            .with_bundle(IoBundle::new(IoType::Usb, "USB").with_lookup())
    }

    #[test]
    fn test_lookup_io_bundle() {
        let aa = sample();

        let com = aa.lookup_io_bundle(IoType::Com, "com1").unwrap();
        assert_eq!(com.name, "COM1");

        assert!(aa.lookup_io_bundle(IoType::Eth, "COM1").is_none());
        assert!(aa.lookup_io_bundle(IoType::Hdmi, "hdmi").is_none());
    }

    #[test]
    fn test_lookup_by_member() {
        let aa = sample();

        let eth = aa.lookup_io_bundle_for_member(IoType::Eth, "eth1").unwrap();
        assert_eq!(eth.name, "eth0-1");
        assert!(aa.lookup_io_bundle_for_member(IoType::Eth, "eth2").is_none());
    }

    #[test]
    fn test_bundles_of_type() {
        let aa = sample();
        assert_eq!(aa.bundles_of_type(IoType::Eth).count(), 1);
        assert_eq!(aa.bundles_of_type(IoType::Audio).count(), 0);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["Model"], "Supermicro.SYS-E100-9APP");
        let eth = &json["IoBundleList"][0];
        assert_eq!(eth["Type"], 1);
        assert_eq!(eth["Members"][1], "eth1");
        assert_eq!(eth["PciLong"], "0000:01:00.0");
        assert!(eth.get("UsedByUUID").is_none());
    }

    #[test]
    fn test_decode_minimal_record() {
        let json = r#"{"Model":"m1","IoBundleList":[{"Type":255,"Name":"gpio"}]}"#;
        let aa: AssignableAdapters = serde_json::from_str(json).unwrap();

        assert_eq!(aa.model, "m1");
        assert_eq!(aa.io_bundle_list[0].io_type, IoType::Other);
        assert!(aa.io_bundle_list[0].members.is_empty());
        assert!(!aa.io_bundle_list[0].is_used());
    }

    #[test]
    fn test_unknown_io_type_rejected() {
        let json = r#"{"Model":"m1","IoBundleList":[{"Type":9,"Name":"x"}]}"#;
        assert!(serde_json::from_str::<AssignableAdapters>(json).is_err());
    }
}
