use std::fs;
use std::path::Path;

use anyhow::Context;
use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use tracing::debug;

use super::encoder::SentenceEncoder;

/// ONNX weights inside a model directory.
pub const ONNX_FILE: &str = "model.onnx";

/// Files every on-disk model directory must contain.
pub const MODEL_FILES: &[&str] = &[
    ONNX_FILE,
    "tokenizer.json",
    "config.json",
    "special_tokens_map.json",
    "tokenizer_config.json",
];

/// Sentence-transformer model run locally through fastembed.
///
/// Weights are loaded from `model_cache_dir/<model_name>/`; mean pooling
/// matches how sentence-transformers models were trained.
pub struct Embedder {
    name: String,
    model: TextEmbedding,
}

impl Embedder {
    /// Load `model_name` from disk.
    ///
    /// If the model files are not found, returns an error instructing the user
    /// to run `remarx model download`.
    pub fn new(model_cache_dir: &Path, model_name: &str) -> anyhow::Result<Self> {
        let base = model_cache_dir.join(model_name);

        let onnx_bytes = fs::read(base.join(ONNX_FILE)).with_context(|| {
            format!(
                "Model not found at {}. Run 'remarx model download' first.",
                base.display()
            )
        })?;

        let tokenizer_files = TokenizerFiles {
            tokenizer_file: fs::read(base.join("tokenizer.json"))
                .context("Missing tokenizer.json")?,
            config_file: fs::read(base.join("config.json")).context("Missing config.json")?,
            special_tokens_map_file: fs::read(base.join("special_tokens_map.json"))
                .context("Missing special_tokens_map.json")?,
            tokenizer_config_file: fs::read(base.join("tokenizer_config.json"))
                .context("Missing tokenizer_config.json")?,
        };

        let user_model =
            UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Mean);

        let model =
            TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
                .with_context(|| format!("Failed to initialize {model_name}"))?;

        debug!(model = model_name, path = %base.display(), "Loaded embedding model");
        Ok(Self {
            name: model_name.to_string(),
            model,
        })
    }
}

impl SentenceEncoder for Embedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn encode(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.model
            .embed(texts.to_vec(), None)
            .context("Failed to embed texts")
    }
}

#[cfg(test)]
mod tests {
    use remarx_test_util::model::model_dir;

    use super::*;
    use crate::config::DEFAULT_MODEL_NAME;
    use crate::embedding::matrix::{EmbeddingMatrix, dot};

    #[test]
    fn missing_model_points_to_download() {
        let tmp = tempfile::tempdir().unwrap();
        let Err(err) = Embedder::new(tmp.path(), DEFAULT_MODEL_NAME) else {
            panic!("model should not load from an empty directory");
        };
        assert!(format!("{err:#}").contains("remarx model download"));
    }

    #[test]
    #[ignore = "requires the downloaded embedding model"]
    fn encode_returns_one_vector_per_text() {
        let mut embedder = Embedder::new(&model_dir(), DEFAULT_MODEL_NAME).unwrap();
        let out = embedder.encode(&["Guten Morgen", "Das Kapital"]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 768);
    }

    #[test]
    #[ignore = "requires the downloaded embedding model"]
    fn paraphrases_score_higher_than_unrelated_text() {
        let mut embedder = Embedder::new(&model_dir(), DEFAULT_MODEL_NAME).unwrap();
        let m = EmbeddingMatrix::from_rows(
            embedder
                .encode(&[
                    "Die Ware ist zunächst ein äußerer Gegenstand.",
                    "Eine Ware ist vor allem ein äußeres Ding.",
                    "Komm zurück zu mir",
                ])
                .unwrap(),
        )
        .unwrap();
        assert!(dot(m.row(0), m.row(1)) > dot(m.row(0), m.row(2)));
    }
}
