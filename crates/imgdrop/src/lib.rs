//! `imgdrop` - Client for an image compression service
//!
//! This library uploads images to the service, renders the reply (message,
//! download link, compression statistics) into a [`View`], and lists the most
//! recently processed images.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod recent;
pub mod service;
pub mod upload;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{FileStats, ImageListing, StatsPanel, UploadOutcome, UploadResponse};
pub use recent::RecentResults;
pub use service::{HttpImageService, ImageService, ServiceReply, UploadFile};
pub use upload::{Submission, UploadClient};
pub use view::{MemoryView, TerminalView, View, ViewState};
