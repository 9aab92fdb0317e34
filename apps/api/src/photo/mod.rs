// Photo assets: reference type, validation rules, the upload controller on
// the editor side, and storage plus endpoints on the server side.

pub mod asset;
pub mod controller;
pub mod handlers;
pub mod store;
pub mod transfer;
pub mod validation;

pub use asset::AssetReference;
pub use controller::{UploadController, UploadError, UploadState};
pub use transfer::{AssetTransfer, SelectedFile};
