//! Record types for the adaptersync configuration channel.
//!
//! # Modules
//!
//! - [`adapters`] - Assignable adapter records, one per hardware model
//! - [`topic`] - Mapping from record type to distribution topic
//! - [`error`] - Record error types

pub mod adapters;
pub mod error;
pub mod topic;

pub use adapters::{AssignableAdapters, IoBundle, IoType};
pub use error::Error;
pub use topic::Topic;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignable_adapters_topic() {
        assert_eq!(AssignableAdapters::TOPIC, "AssignableAdapters");
    }

    #[test]
    fn test_io_type_codes() {
        for io_type in [
            IoType::Nop,
            IoType::Eth,
            IoType::Usb,
            IoType::Com,
            IoType::Hdmi,
            IoType::Audio,
            IoType::Other,
        ] {
            assert_eq!(IoType::try_from(io_type.code()).unwrap(), io_type);
        }
        assert!(matches!(IoType::try_from(7u8), Err(Error::UnknownIoType(7))));
    }
}
