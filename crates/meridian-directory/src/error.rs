//! Error types for zone/endpoint registration.

use meridian_types::ZoneName;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("no zone registered named '{0}'")]
    UnknownZone(ZoneName),

    #[error("zone '{0}' is already registered")]
    ZoneAlreadyRegistered(ZoneName),

    #[error("zone '{zone}' would become its own ancestor via parent '{parent}'")]
    CyclicParent { zone: ZoneName, parent: ZoneName },
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
