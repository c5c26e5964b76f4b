use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::Tensor;
use tracing::info;

/// Seam in front of the pre-trained model. The adapter feeds a flat NHWC
/// pixel buffer and gets back one probability per class, in the order of
/// [`crate::inference::adapter::LABELS`].
pub trait Classifier: Send + Sync {
    fn input_size(&self) -> u32;
    fn run(&self, pixels: Vec<f32>, shape: [usize; 4]) -> Result<Vec<f32>>;
}

/// ONNX-backed production classifier. The session is loaded once at startup
/// and shared behind a lock because `run` needs exclusive access.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    input_size: u32,
}

impl OnnxClassifier {
    pub fn load(path: &Path, input_size: u32) -> Result<Self> {
        ort::init()
            .with_name("dentascan")
            .commit()
            .map_err(|e| anyhow!("failed to initialize ONNX Runtime: {e}"))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1)?
            .commit_from_file(path)
            .with_context(|| format!("load classifier model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| anyhow!("classifier model declares no inputs"))?;

        info!(model = %path.display(), input = %input_name, input_size, "classifier loaded");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            input_size,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn run(&self, pixels: Vec<f32>, shape: [usize; 4]) -> Result<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("classifier session lock poisoned"))?;

        let tensor = Tensor::from_array((shape, pixels.into_boxed_slice()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;
        let output = scores_output(&outputs)?;
        let (_shape, data) = output.try_extract_tensor::<f32>()?;
        Ok(data.to_vec())
    }
}

fn scores_output<'a>(outputs: &'a SessionOutputs<'_>) -> Result<&'a ort::value::Value> {
    let key = outputs
        .keys()
        .next()
        .ok_or_else(|| anyhow!("classifier produced no outputs"))?;
    outputs
        .get(key)
        .ok_or_else(|| anyhow!("classifier output {key} has no value"))
}

/// Returns a canned score vector; stands in for the model in tests and in
/// `AppState::fake`.
pub struct FixedClassifier {
    scores: Vec<f32>,
    input_size: u32,
}

impl FixedClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            input_size: 224,
        }
    }
}

impl Classifier for FixedClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn run(&self, _pixels: Vec<f32>, _shape: [usize; 4]) -> Result<Vec<f32>> {
        Ok(self.scores.clone())
    }
}
