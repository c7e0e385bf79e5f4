// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager: loads the detection and segmentation models once at
//! startup and hands out shared, read-only references to them

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::vision::yolo::{Detection, InferenceError, SegmentedObject, YoloOnnxModel, YoloParams};

/// What a model was trained to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Detect,
    Segment,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Detect => write!(f, "detect"),
            Task::Segment => write!(f, "segment"),
        }
    }
}

/// Information about a loaded model, as served by `get_models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name (file stem, e.g. "yolo26n-seg")
    pub name: String,
    /// Path of the weights file
    pub checkpoint: String,
    /// Export date recorded in the model, or the load time when absent
    pub date: String,
    pub task: Task,
    pub loaded_at: DateTime<Utc>,
}

/// A model that finds objects in an image
pub trait ObjectDetector: Send + Sync {
    fn metadata(&self) -> &ModelMetadata;

    /// Detections in the model's native order, boxes in original-image pixels
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError>;
}

/// A model that finds objects and their pixel masks
pub trait ImageSegmenter: Send + Sync {
    fn metadata(&self) -> &ModelMetadata;

    /// Objects with masks the size of `image`
    fn segment(&self, image: &DynamicImage) -> Result<Vec<SegmentedObject>, InferenceError>;
}

/// Where to find model weights and how to run them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionModelConfig {
    /// Base data directory
    pub data_dir: PathBuf,
    /// Directory holding the weights, relative to `data_dir`
    pub model_binary_dir: PathBuf,
    pub detection_model_file: String,
    pub segmentation_model_file: String,
    /// ONNX Runtime intra-op threads per session
    pub intra_threads: usize,
    pub params: YoloParams,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            model_binary_dir: PathBuf::from("models"),
            detection_model_file: "yolo26n.onnx".to_string(),
            segmentation_model_file: "yolo26n-seg.onnx".to_string(),
            intra_threads: 4,
            params: YoloParams::default(),
        }
    }
}

impl VisionModelConfig {
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join(&self.model_binary_dir)
    }

    pub fn detection_model_path(&self) -> PathBuf {
        self.model_dir().join(&self.detection_model_file)
    }

    pub fn segmentation_model_path(&self) -> PathBuf {
        self.model_dir().join(&self.segmentation_model_file)
    }
}

/// Holds the loaded models
///
/// Models are immutable after load and shared across concurrent requests.
#[derive(Clone, Default)]
pub struct VisionModelManager {
    detector: Option<Arc<dyn ObjectDetector>>,
    segmenter: Option<Arc<dyn ImageSegmenter>>,
}

impl fmt::Debug for VisionModelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionModelManager")
            .field("models", &self.list_models())
            .finish()
    }
}

impl VisionModelManager {
    /// A manager with no models; `get_models` returns an empty list
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load both YOLO models from disk
    ///
    /// Both weight files must exist: a missing model is a startup failure,
    /// not something to discover on the first request.
    pub async fn load(config: &VisionModelConfig) -> Result<Self> {
        let detection_path = config.detection_model_path();
        let segmentation_path = config.segmentation_model_path();

        for path in [&detection_path, &segmentation_path] {
            if !path.exists() {
                anyhow::bail!("Model file {} not found", path.display());
            }
        }

        info!("Loading detection model file {}", detection_path.display());
        let detector = load_model(config, &detection_path, Task::Detect)
            .await
            .context("Failed to load detection model")?;

        info!("Loading segmentation model file {}", segmentation_path.display());
        let segmenter = load_model(config, &segmentation_path, Task::Segment)
            .await
            .context("Failed to load segmentation model")?;

        info!("✅ YOLO models loaded");

        Ok(Self::empty()
            .with_detector(Arc::new(detector))
            .with_segmenter(Arc::new(segmenter)))
    }

    pub fn with_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_segmenter(mut self, segmenter: Arc<dyn ImageSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn detector(&self) -> Option<Arc<dyn ObjectDetector>> {
        self.detector.clone()
    }

    pub fn segmenter(&self) -> Option<Arc<dyn ImageSegmenter>> {
        self.segmenter.clone()
    }

    /// Metadata of every loaded model, detection first
    pub fn list_models(&self) -> Vec<ModelMetadata> {
        let detector = self.detector.iter().map(|d| d.metadata().clone());
        let segmenter = self.segmenter.iter().map(|s| s.metadata().clone());
        detector.chain(segmenter).collect()
    }

    pub fn model_count(&self) -> usize {
        self.detector.is_some() as usize + self.segmenter.is_some() as usize
    }
}

async fn load_model(config: &VisionModelConfig, path: &Path, task: Task) -> Result<YoloOnnxModel> {
    let path = path.to_path_buf();
    let params = config.params.clamped();
    let threads = config.intra_threads.max(1);

    // Session creation parses and optimises the graph; keep it off the runtime threads
    tokio::task::spawn_blocking(move || YoloOnnxModel::load(&path, task, params, threads))
        .await
        .context("Model loading task panicked")?
}
