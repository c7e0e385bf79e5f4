// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime wrapper for exported YOLO models

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use image::DynamicImage;
use ndarray::{Array3, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info, warn};

use super::class_names::{label_for, parse_class_names, parse_input_size};
use super::masks::build_mask;
use super::postprocessing::{decode_predictions, RawBox};
use super::preprocessing::letterbox;
use super::{Detection, InferenceError, Letterbox, SegmentedObject, YoloParams, DEFAULT_INPUT_SIZE};
use crate::vision::model_manager::{ImageSegmenter, ModelMetadata, ObjectDetector, Task};

/// A YOLO detection or segmentation model
///
/// Runs on CPU. The session is behind a mutex because ONNX Runtime needs
/// exclusive access per run; everything else is read-only after load.
#[derive(Clone)]
pub struct YoloOnnxModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_count: usize,
    input_size: u32,
    class_names: Arc<Vec<String>>,
    params: YoloParams,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for YoloOnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloOnnxModel")
            .field("name", &self.metadata.name)
            .field("task", &self.metadata.task)
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("classes", &self.class_names.len())
            .finish_non_exhaustive()
    }
}

/// Raw outputs of one inference pass
struct RawPrediction {
    boxes: Vec<RawBox>,
    protos: Option<Array3<f32>>,
    letterbox: Letterbox,
}

impl YoloOnnxModel {
    /// Load an exported model file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - A segmentation model lacks the prototype output
    pub fn load(model_path: &Path, task: Task, params: YoloParams, intra_threads: usize) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("Model file {} not found", model_path.display());
        }

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!("Failed to load model from {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());
        let output_count = session.outputs.len();

        if task == Task::Segment && output_count < 2 {
            anyhow::bail!(
                "{} has {} output(s); a segmentation model needs predictions and prototypes",
                model_path.display(),
                output_count
            );
        }

        let (names_raw, imgsz_raw, date_raw, task_raw) = {
            let meta = session.metadata().ok();
            let custom = |key: &str| meta.as_ref().and_then(|m| m.custom(key).ok().flatten());
            (custom("names"), custom("imgsz"), custom("date"), custom("task"))
        };

        let class_names = names_raw.as_deref().map(parse_class_names).unwrap_or_default();
        if class_names.is_empty() {
            warn!(
                "{} has no class names in its metadata, labels will be class ids",
                model_path.display()
            );
        }

        let input_size = imgsz_raw
            .as_deref()
            .and_then(parse_input_size)
            .unwrap_or(DEFAULT_INPUT_SIZE);

        if let Some(declared) = task_raw.as_deref() {
            if declared != task.to_string() {
                warn!(
                    "{} declares task '{}' but is loaded for '{}'",
                    model_path.display(),
                    declared,
                    task
                );
            }
        }

        let loaded_at = Utc::now();
        let metadata = ModelMetadata {
            name: model_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "yolo".to_string()),
            checkpoint: model_path.display().to_string(),
            date: date_raw.unwrap_or_else(|| loaded_at.to_rfc3339()),
            task,
            loaded_at,
        };

        info!(
            "Model {} ready - task: {}, input: {} ({}px), outputs: {}, classes: {}",
            metadata.name,
            task,
            input_name,
            input_size,
            output_count,
            class_names.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_count,
            input_size,
            class_names: Arc::new(class_names),
            params,
            metadata,
        })
    }

    fn run(&self, image: &DynamicImage, with_masks: bool) -> Result<RawPrediction, InferenceError> {
        let (tensor, letterbox) = letterbox(image, self.input_size);
        let input_value = Value::from_array(tensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::SessionPoisoned)?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let protos = if with_masks {
            if self.output_count < 2 {
                return Err(InferenceError::UnexpectedOutput(
                    "model has no prototype output".to_string(),
                ));
            }
            let protos = outputs[1].try_extract_array::<f32>()?;
            let shape = protos.shape().to_vec();
            // [1, nm, h, w] -> [nm, h, w]
            if shape.len() != 4 || shape[0] != 1 {
                return Err(InferenceError::UnexpectedOutput(format!(
                    "prototype shape {:?}, expected [1, nm, h, w]",
                    shape
                )));
            }
            Some(
                protos
                    .to_owned()
                    .into_shape_with_order((shape[1], shape[2], shape[3]))?,
            )
        } else {
            None
        };

        let num_coeffs = protos.as_ref().map(|p| p.dim().0).unwrap_or(0);
        let predictions = outputs[0].try_extract_array::<f32>()?;
        debug!("{} prediction shape: {:?}", self.metadata.name, predictions.shape());

        let predictions = predictions.into_dimensionality::<Ix3>()?;
        let boxes = decode_predictions(predictions, num_coeffs, &self.params)?;

        Ok(RawPrediction {
            boxes,
            protos,
            letterbox,
        })
    }

    fn to_detection(&self, raw: &RawBox, letterbox: &Letterbox) -> Detection {
        Detection {
            bbox: letterbox.box_to_original(raw.bbox),
            confidence: raw.score.clamp(0.0, 1.0),
            class_id: raw.class_id,
            label: label_for(&self.class_names, raw.class_id),
        }
    }
}

impl ObjectDetector for YoloOnnxModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        let prediction = self.run(image, false)?;
        let detections: Vec<Detection> = prediction
            .boxes
            .iter()
            .map(|raw| self.to_detection(raw, &prediction.letterbox))
            .filter(|d| d.bbox[2] > d.bbox[0] && d.bbox[3] > d.bbox[1])
            .collect();

        debug!("{} detected {} objects", self.metadata.name, detections.len());
        Ok(detections)
    }
}

impl ImageSegmenter for YoloOnnxModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn segment(&self, image: &DynamicImage) -> Result<Vec<SegmentedObject>, InferenceError> {
        let prediction = self.run(image, true)?;
        let protos = prediction
            .protos
            .as_ref()
            .ok_or_else(|| InferenceError::UnexpectedOutput("missing prototypes".to_string()))?;

        let mut objects = Vec::with_capacity(prediction.boxes.len());
        for raw in &prediction.boxes {
            let detection = self.to_detection(raw, &prediction.letterbox);
            if detection.bbox[2] <= detection.bbox[0] || detection.bbox[3] <= detection.bbox[1] {
                continue;
            }
            let mask = build_mask(&raw.coeffs, protos.view(), detection.bbox, &prediction.letterbox)?;
            objects.push(SegmentedObject { detection, mask });
        }

        debug!("{} segmented {} objects", self.metadata.name, objects.len());
        Ok(objects)
    }
}
