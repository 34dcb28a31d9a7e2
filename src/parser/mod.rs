pub mod alias;
pub mod normalize;
pub mod title;

pub use alias::ShowNormalizer;
pub use normalize::{canonical_key, clean_string};
pub use title::TitleParser;
