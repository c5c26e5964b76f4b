use image::imageops::FilterType;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::inference::classifier::Classifier;

/// Class order of the model's output vector. Index i of the score vector is
/// the probability of `LABELS[i]`; reorder here if a new model artifact is
/// exported with a different label file.
pub const LABELS: [&str; 5] = ["Calculus", "Caries", "Healthy", "Hypodontia", "Mouth Ulcer"];

/// Anything that goes wrong between the uploaded bytes and the score vector.
/// All variants surface to the client as a 400 with a retry hint, never as a
/// 500.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Unable to read the uploaded image: {0}.")]
    Decode(#[from] image::ImageError),
    #[error("The classifier could not process the image: {0}.")]
    Runtime(String),
    #[error("Unexpected classifier output: {0}.")]
    BadOutput(String),
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub label: String,
    pub confidence_score: f64,
    pub suggestion: String,
    pub explanation: String,
}

/// Decode, resize, normalize, classify, and turn the winning class into the
/// user-facing prediction.
pub fn classify_image(
    classifier: &dyn Classifier,
    image_bytes: &[u8],
) -> Result<Prediction, InferenceError> {
    let size = classifier.input_size();
    let (pixels, shape) = preprocess(image_bytes, size)?;
    let scores = classifier
        .run(pixels, shape)
        .map_err(|e| InferenceError::Runtime(e.to_string()))?;
    let prediction = scores_to_prediction(&scores)?;
    debug!(label = %prediction.label, confidence = prediction.confidence_score, "image classified");
    Ok(prediction)
}

/// Sniffs JPEG/PNG from the bytes, resizes nearest-neighbor to the model's
/// square input, scales pixels to [0,1] and flattens to an NHWC batch of one.
fn preprocess(image_bytes: &[u8], size: u32) -> Result<(Vec<f32>, [usize; 4]), InferenceError> {
    let decoded = image::load_from_memory(image_bytes)?;
    let rgb = decoded.resize_exact(size, size, FilterType::Nearest).to_rgb8();
    let pixels = rgb
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();
    Ok((pixels, [1, size as usize, size as usize, 3]))
}

fn scores_to_prediction(scores: &[f32]) -> Result<Prediction, InferenceError> {
    if scores.len() != LABELS.len() {
        return Err(InferenceError::BadOutput(format!(
            "expected {} class scores, got {}",
            LABELS.len(),
            scores.len()
        )));
    }

    let (winner, top_score) = scores
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| InferenceError::BadOutput("empty score vector".into()))?;

    let label = LABELS[winner];
    // Fail closed: a label without guidance must never reach a client as
    // empty strings.
    let (suggestion, explanation) = guidance_for(label).ok_or_else(|| {
        InferenceError::BadOutput(format!("no guidance entry for label {label}"))
    })?;

    Ok(Prediction {
        label: label.to_string(),
        confidence_score: (f64::from(top_score) * 100.0).clamp(0.0, 100.0),
        suggestion: suggestion.to_string(),
        explanation: explanation.to_string(),
    })
}

fn guidance_for(label: &str) -> Option<(&'static str, &'static str)> {
    match label {
        "Calculus" => Some((
            "Book a professional scaling session; hardened tartar cannot be removed by brushing alone.",
            "Calculus is plaque that has mineralized along the gum line. Left in place it irritates the gums and can progress to gingivitis and periodontitis.",
        )),
        "Caries" => Some((
            "Visit a dentist to have the cavity cleaned and filled, and cut down on sugary snacks between meals.",
            "Caries are decayed areas of the tooth surface caused by acid-producing bacteria. Small lesions are painless but grow toward the nerve if untreated.",
        )),
        "Healthy" => Some((
            "Keep brushing twice a day with fluoride toothpaste and schedule a routine check-up every six months.",
            "No visible signs of disease were detected. Teeth and gums in the photo look within the healthy range.",
        )),
        "Hypodontia" => Some((
            "Consult an orthodontist about space management; implants or bridges can restore the missing teeth.",
            "Hypodontia is the congenital absence of one or more teeth. Gaps can shift neighboring teeth and affect bite if not managed.",
        )),
        "Mouth Ulcer" => Some((
            "Rinse with warm salt water and use a topical gel; see a dentist if the sore lasts more than two weeks.",
            "Mouth ulcers are small painful lesions of the oral lining, usually triggered by minor injury or stress, and normally heal on their own.",
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::classifier::FixedClassifier;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(3, 5, image::Rgb([255, 0, 128]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn every_label_has_guidance() {
        for label in LABELS {
            let (suggestion, explanation) = guidance_for(label).unwrap();
            assert!(!suggestion.is_empty());
            assert!(!explanation.is_empty());
        }
    }

    #[test]
    fn unknown_label_fails_closed() {
        assert!(guidance_for("Gingivitis").is_none());
    }

    #[test]
    fn preprocess_produces_normalized_nhwc_batch() {
        let (pixels, shape) = preprocess(&tiny_png(), 8).unwrap();
        assert_eq!(shape, [1, 8, 8, 3]);
        assert_eq!(pixels.len(), 8 * 8 * 3);
        assert!(pixels.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn preprocess_rejects_non_image_bytes() {
        let err = preprocess(b"definitely not an image", 8).unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[test]
    fn argmax_picks_the_winning_label() {
        let prediction = scores_to_prediction(&[0.05, 0.72, 0.1, 0.08, 0.05]).unwrap();
        assert_eq!(prediction.label, "Caries");
        assert!((prediction.confidence_score - 72.0).abs() < 1e-6);
        assert!(!prediction.suggestion.is_empty());
        assert!(!prediction.explanation.is_empty());
    }

    #[test]
    fn confidence_is_clamped_to_the_percentage_range() {
        let prediction = scores_to_prediction(&[1.2, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(prediction.confidence_score, 100.0);
    }

    #[test]
    fn wrong_score_arity_is_a_bad_output() {
        let err = scores_to_prediction(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, InferenceError::BadOutput(_)));
    }

    #[test]
    fn classify_image_runs_end_to_end_with_a_fixed_model() {
        let classifier = FixedClassifier::new(vec![0.01, 0.02, 0.9, 0.03, 0.04]);
        let prediction = classify_image(&classifier, &tiny_png()).unwrap();
        assert_eq!(prediction.label, "Healthy");
        assert!(LABELS.contains(&prediction.label.as_str()));
        assert!((0.0..=100.0).contains(&prediction.confidence_score));
    }

    #[test]
    fn inference_errors_map_to_invalid_input() {
        let classifier = FixedClassifier::new(vec![]);
        let err = classify_image(&classifier, &tiny_png()).unwrap_err();
        let api: ApiError = err.into();
        assert!(matches!(api, ApiError::InvalidInput(_)));
    }
}
