//! Resource classification and download routing
//!
//! - `classifier`: maps a URL's path extension to a download category
//! - `router`: fetches and stores resources for the enabled categories

mod classifier;
mod router;

pub use classifier::{classify, path_extension, ResourceCategory};
pub use router::{DownloadReport, DownloadRouter};
