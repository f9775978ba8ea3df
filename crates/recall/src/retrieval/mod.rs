//! Hint retrieval: candidate ranking, noise sources and hint templates

pub mod noise;
pub mod policy;
pub mod prompts;

pub use noise::{FixedNoise, NoiseSource, SeededNoise};
pub use policy::{Hint, HintPath, RankedPick, RetrievalPolicy};
pub use prompts::DIFF_FALLBACK;
