//! Versioned save files for medley datasets.
//!
//! Serializes every list (records, tag catalogs, edge sets, content
//! ratings, and view layout hints) into a portable JSON container and
//! restores it into a live store. Derived tag text is never written to
//! a file; it is rematerialized by one view refresh after loading.

pub mod codec;

pub use codec::{
    decode, encode, load_dataset, restore_list, save_dataset, snapshot_dataset, SaveError,
    CURRENT_SAVE_VERSION,
};
