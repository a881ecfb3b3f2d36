//! Local BGE-M3 (XLM-RoBERTa) encoder.
//!
//! Loads `tokenizer.json`, `config.json` and `pytorch_model.bin` from a model
//! directory and produces mean-pooled, L2-normalized sentence vectors.
use anyhow::{anyhow, ensure, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use passage_core::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::encode_padded;

pub struct BgeEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl BgeEmbedder {
    pub fn load(model_dir: &Path, dim: usize, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dim, max_len, "BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }
}

impl Embedder for BgeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dim]);
        }
        let start = Instant::now();
        let (input_ids, attention_mask) = encode_padded(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        ensure!(v.len() == self.dim, "model produced {} dimensions, configured {}", v.len(), self.dim);
        tracing::trace!(elapsed_ms = start.elapsed().as_millis() as u64, "embedded text");
        Ok(v)
    }
}

/// First existing directory among the configured one, `APP_MODEL_DIR`, `MODEL_DIR`, `models/bge-m3`.
pub fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = configured
        .map(passage_core::config::expand_path)
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from))
        .chain(std::env::var("MODEL_DIR").ok().map(PathBuf::from))
        .chain([PathBuf::from("models/bge-m3"), PathBuf::from("../models/bge-m3")]);
    for dir in candidates {
        if dir.is_dir() {
            return Ok(dir);
        }
    }
    Err(anyhow!("could not locate the BGE-M3 model directory"))
}
