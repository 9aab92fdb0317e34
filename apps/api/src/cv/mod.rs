// CV records: editable model, record codec, save gate, editor session,
// and the server-side store and endpoints for the persisted shape.

pub mod backend;
pub mod codec;
pub mod handlers;
pub mod models;
pub mod session;
pub mod store;
pub mod validation;

pub use codec::{decode, encode};
pub use models::{CvRecord, EditableCv, UserProfile};
pub use session::{EditorSession, LoadOutcome, SaveError};
