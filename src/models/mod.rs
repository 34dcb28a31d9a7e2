pub mod episode;
pub mod release;

pub use episode::{CanonicalTitle, EpisodeIdentity, EpisodeMarker, Lookup};
pub use release::{ReleaseItem, Site};
