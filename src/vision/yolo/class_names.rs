// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class names and input size from YOLO ONNX metadata
//!
//! The exporter stores Python literals in the model's custom metadata, e.g.
//! `names = "{0: 'person', 1: 'bicycle'}"` and `imgsz = "[640, 640]"`.

use std::sync::OnceLock;

use regex::Regex;

fn names_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).expect("class names pattern is valid")
    })
}

/// Parse the `names` dictionary into a vector indexed by class id
///
/// Gaps in the id sequence are filled with `class_<id>`.
pub fn parse_class_names(raw: &str) -> Vec<String> {
    let mut entries: Vec<(usize, String)> = names_pattern()
        .captures_iter(raw)
        .filter_map(|cap| {
            let id = cap.get(1)?.as_str().parse::<usize>().ok()?;
            let name = cap.get(2).or_else(|| cap.get(3))?.as_str().to_string();
            Some((id, name))
        })
        .collect();

    let Some(max_id) = entries.iter().map(|(id, _)| *id).max() else {
        return Vec::new();
    };

    let mut names: Vec<String> = (0..=max_id).map(fallback_label).collect();
    for (id, name) in entries.drain(..) {
        names[id] = name;
    }
    names
}

/// Parse `imgsz`, returning the first dimension
pub fn parse_input_size(raw: &str) -> Option<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .filter(|size| *size > 0)
}

/// Label for a class id
pub fn label_for(names: &[String], class_id: usize) -> String {
    names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| fallback_label(class_id))
}

fn fallback_label(class_id: usize) -> String {
    format!("class_{}", class_id)
}
