pub mod archive;
pub mod cleaner;
pub mod engine;
pub mod filter;
pub mod uploader;

pub use archive::{is_archive, DeleteConfirmation, PostProcessor};
pub use cleaner::CleanupPlanner;
pub use engine::{SyncEngine, SyncOptions, SyncReport};
pub use filter::FilterMode;
pub use uploader::{UploadExecutor, UploadOutcome};
