//! cvsync: CV record synchronisation.
//!
//! Editor side: [`cv::EditorSession`] and [`photo::UploadController`], talking
//! to the API through [`client::HttpBackend`]. Server side: the axum router in
//! [`routes`] over Postgres and S3 stores.

pub mod client;
pub mod config;
pub mod cv;
pub mod db;
pub mod errors;
pub mod models;
pub mod photo;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;
