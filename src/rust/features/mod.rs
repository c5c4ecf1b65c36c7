//! URL feature extraction and alignment to a model's feature schema.

mod extractor;
mod lexicon;
mod map;
mod schema;
mod url_parts;
mod utils;

pub use extractor::{extract, FeatureExtractor, FEATURE_NAMES};
pub use lexicon::{Lexicon, LEXICON_VERSION};
pub use map::FeatureMap;
pub use schema::{align, FeatureSchema};
pub use url_parts::UrlParts;
pub use utils::shannon_entropy;
