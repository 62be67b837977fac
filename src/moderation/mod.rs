//! Comment moderation: text normalization, bullying classification and
//! the reputation state machine that gates commenting and following.

pub mod classifier;
mod lemmatizer;
pub mod normalizer;
pub mod reputation;
mod stopwords;

pub use classifier::{BullyingClassifier, ModelClassifier, Vocabulary, sentences_to_indices};
pub use normalizer::normalize;
pub use reputation::{ReputationOutcome, ReputationPolicy, ReputationState};
