use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::Array2;
use ort::{session::Session, value::Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::normalizer::normalize;
use crate::config::ClassifierConfig;

/// Word to embedding-index table the model was trained with.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, i64>,
}

impl Vocabulary {
    /// Loads a JSON object of `{"word": index}` pairs.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary: {}", path.display()))?;
        let index: HashMap<String, i64> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse vocabulary: {}", path.display()))?;
        Ok(Self { index })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        Self {
            index: pairs
                .into_iter()
                .map(|(word, idx)| (word.to_string(), idx))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<i64> {
        self.index.get(word).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Maps normalized text to a zero-filled index sequence of length `max_len`.
///
/// Known words are written left to right in the order they appear; unknown
/// words are skipped without leaving a gap. Words beyond the last slot are
/// ignored.
#[must_use]
pub fn sentences_to_indices(text: &str, vocabulary: &Vocabulary, max_len: usize) -> Vec<i64> {
    let mut indices = vec![0; max_len];
    let known = text
        .split_whitespace()
        .filter_map(|word| vocabulary.get(&word.to_lowercase()));

    for (slot, idx) in indices.iter_mut().zip(known) {
        *slot = idx;
    }
    indices
}

/// Scores raw comment text for bullying content.
#[async_trait]
pub trait BullyingClassifier: Send + Sync {
    /// Probability in [0, 1]. Never fails: a classifier that cannot run
    /// scores everything 0.0.
    async fn score(&self, text: &str) -> f64;

    /// True when the model artifacts are unavailable and every score is 0.0.
    fn is_degraded(&self) -> bool;
}

enum ClassifierState {
    Ready {
        session: Arc<Mutex<Session>>,
        vocabulary: Arc<Vocabulary>,
    },
    Degraded {
        reason: String,
    },
}

/// ONNX model plus vocabulary, loaded once at startup.
pub struct ModelClassifier {
    state: ClassifierState,
    max_len: usize,
}

impl ModelClassifier {
    /// Loads both artifacts. Any failure puts the classifier in degraded
    /// mode instead of returning an error.
    #[must_use]
    pub fn load(config: &ClassifierConfig) -> Self {
        match Self::load_artifacts(config) {
            Ok((session, vocabulary)) => {
                info!(
                    model = %config.model_path,
                    vocabulary_size = vocabulary.len(),
                    "Bullying classifier loaded"
                );
                Self {
                    state: ClassifierState::Ready {
                        session: Arc::new(Mutex::new(session)),
                        vocabulary: Arc::new(vocabulary),
                    },
                    max_len: config.max_len,
                }
            }
            Err(e) => {
                warn!(
                    model = %config.model_path,
                    vocabulary = %config.vocabulary_path,
                    "Bullying classifier unavailable, comments will score 0.0: {e:#}"
                );
                Self::degraded(e.to_string(), config.max_len)
            }
        }
    }

    #[must_use]
    pub const fn degraded(reason: String, max_len: usize) -> Self {
        Self {
            state: ClassifierState::Degraded { reason },
            max_len,
        }
    }

    #[must_use]
    pub fn degraded_reason(&self) -> Option<&str> {
        match &self.state {
            ClassifierState::Degraded { reason } => Some(reason),
            ClassifierState::Ready { .. } => None,
        }
    }

    fn load_artifacts(config: &ClassifierConfig) -> Result<(Session, Vocabulary)> {
        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            anyhow::bail!("model file not found at {}", model_path.display());
        }

        let vocabulary = Vocabulary::load(Path::new(&config.vocabulary_path))?;
        if vocabulary.is_empty() {
            anyhow::bail!("vocabulary is empty");
        }

        let session = Session::builder()?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load model: {}", model_path.display()))?;

        Ok((session, vocabulary))
    }
}

/// Builds the `[1, max_len]` f32 model input from padded word indices.
fn input_tensor(indices: &[i64]) -> Array2<f32> {
    let mut input = Array2::<f32>::zeros((1, indices.len()));
    for (slot, idx) in input.iter_mut().zip(indices) {
        #[allow(clippy::cast_precision_loss)]
        {
            *slot = *idx as f32;
        }
    }
    input
}

/// Reads the bullying probability from the model output: the first
/// value, clamped to [0, 1], with NaN read as 0.0.
fn probability_from_output(data: &[f32]) -> Result<f64> {
    let probability = data
        .first()
        .copied()
        .context("model returned an empty tensor")?;

    Ok(if probability.is_nan() {
        0.0
    } else {
        f64::from(probability).clamp(0.0, 1.0)
    })
}

fn run_inference(session: &Mutex<Session>, indices: &[i64]) -> Result<f64> {
    let input = input_tensor(indices);
    let input_shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
    let input_value = Value::from_array((input_shape, input.into_raw_vec()))?;

    let mut session = session
        .lock()
        .map_err(|_| anyhow::anyhow!("Failed to acquire session lock"))?;
    let outputs = session.run(ort::inputs![input_value])?;
    let (_, data) = outputs[0].try_extract_tensor::<f32>()?;

    probability_from_output(data)
}

#[async_trait]
impl BullyingClassifier for ModelClassifier {
    async fn score(&self, text: &str) -> f64 {
        let ClassifierState::Ready {
            session,
            vocabulary,
        } = &self.state
        else {
            return 0.0;
        };

        let indices = sentences_to_indices(&normalize(text), vocabulary, self.max_len);
        let session = Arc::clone(session);

        match tokio::task::spawn_blocking(move || run_inference(&session, &indices)).await {
            Ok(Ok(score)) => score,
            Ok(Err(e)) => {
                warn!("Classifier inference failed, scoring 0.0: {e:#}");
                0.0
            }
            Err(e) => {
                warn!("Classifier task panicked, scoring 0.0: {e}");
                0.0
            }
        }
    }

    fn is_degraded(&self) -> bool {
        matches!(self.state, ClassifierState::Degraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> Vocabulary {
        Vocabulary::from_pairs([("loser", 7), ("ugly", 3), ("photo", 12), ("nobody", 40)])
    }

    #[test]
    fn test_known_words_fill_in_order() {
        let indices = sentences_to_indices("loser nobody like ugly photo", &vocabulary(), 30);
        assert_eq!(indices.len(), 30);
        assert_eq!(&indices[..5], &[7, 40, 3, 12, 0]);
        assert!(indices[4..].iter().all(|&i| i == 0));
    }

    #[test]
    fn test_unknown_words_leave_no_gap() {
        let indices = sentences_to_indices("zzz ugly qqq photo", &vocabulary(), 4);
        assert_eq!(indices, vec![3, 12, 0, 0]);
    }

    #[test]
    fn test_sequence_is_truncated() {
        let indices = sentences_to_indices("ugly ugly ugly ugly ugly", &vocabulary(), 3);
        assert_eq!(indices, vec![3, 3, 3]);
    }

    #[test]
    fn test_empty_text_is_all_zeros() {
        assert_eq!(sentences_to_indices("", &vocabulary(), 5), vec![0; 5]);
    }

    #[test]
    fn test_input_tensor_shape_and_values() {
        let indices = sentences_to_indices("ugly zzz loser", &vocabulary(), 6);
        let input = input_tensor(&indices);
        assert_eq!(input.shape(), &[1, 6]);
        assert_eq!(input.row(0).to_vec(), vec![3.0, 7.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_probability_is_clamped() {
        assert!((probability_from_output(&[0.73]).unwrap() - 0.73).abs() < 1e-6);
        assert_eq!(probability_from_output(&[-0.5]).unwrap().to_bits(), 0.0_f64.to_bits());
        assert_eq!(probability_from_output(&[1.7]).unwrap().to_bits(), 1.0_f64.to_bits());
        assert_eq!(probability_from_output(&[f32::NAN]).unwrap().to_bits(), 0.0_f64.to_bits());
        assert!((probability_from_output(&[0.2, 0.9]).unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_output_is_an_error() {
        assert!(probability_from_output(&[]).is_err());
    }

    #[tokio::test]
    async fn test_missing_artifacts_fail_open() {
        let config = ClassifierConfig {
            model_path: "/nonexistent/model.onnx".to_string(),
            vocabulary_path: "/nonexistent/vocab.json".to_string(),
            max_len: 30,
        };

        let classifier = ModelClassifier::load(&config);
        assert!(classifier.is_degraded());
        assert!(classifier.degraded_reason().is_some());

        for text in ["", "you are a loser", "lovely photo!"] {
            assert_eq!(classifier.score(text).await.to_bits(), 0.0_f64.to_bits());
        }
    }

    #[test]
    fn test_vocabulary_load_rejects_bad_json() {
        let path = std::env::temp_dir().join(format!("vocab-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();
        assert!(Vocabulary::load(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_vocabulary_load() {
        let path = std::env::temp_dir().join(format!("vocab-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"loser": 7, "ugly": 3}"#).unwrap();
        let vocabulary = Vocabulary::load(&path).unwrap();
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.get("loser"), Some(7));
        assert_eq!(vocabulary.get("nice"), None);
        std::fs::remove_file(&path).ok();
    }
}
