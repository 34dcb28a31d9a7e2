pub mod archive;
pub mod disk;
pub mod naming;

pub use archive::NzbArchive;
pub use disk::DiskScanner;
pub use naming::{EpisodePaths, NamingTemplater};
