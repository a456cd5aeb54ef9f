// Keyforge - Store Module
//
// On-disk layout of generated keystores. Live records sit under
// `generated/<package>/`; superseded records are renamed (never deleted)
// into `generated_old/<package>[-N]/`.

mod archive;
mod error;
mod layout;
mod record;

pub use archive::ArchiveManager;
pub use error::StoreError;
pub use layout::{PackageId, ProjectPaths, StorageLayout, INFO_FILE};
pub use record::{read_credentials, KeyInfo, KeystoreRecord, Requester};
