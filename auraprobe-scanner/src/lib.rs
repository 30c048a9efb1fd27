pub mod bootstrap;
pub mod discovery;
pub mod download;
pub mod error;
pub mod exploit;
pub mod protocol;
pub mod target;
pub mod transport;

pub use bootstrap::{AuraContext, ContextExtractor, PatternExtractor, bootstrap};
pub use discovery::discover;
pub use download::{DownloadReport, download_files};
pub use error::ScanError;
pub use exploit::execute;
pub use protocol::{ActionResponse, ActionResult, ActionState, RecordPage};
pub use target::Target;
pub use transport::TransportConfig;
