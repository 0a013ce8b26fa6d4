//! Policy weights: tensors keyed by parameter name, parameter accounting,
//! and the safetensors file format used on the hub.

use std::collections::BTreeMap;
use std::path::Path;

use safetensors::tensor::{Dtype, SafeTensors, TensorView};

/// Elements per reported kilobyte in the size summary.
pub const ELEMENTS_PER_KB: f64 = 256.0;

/// Errors produced while building, writing or reading weights.
#[derive(Debug, thiserror::Error)]
pub enum WeightsError {
    #[error("shape {shape:?} needs {expected} values, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("tensor `{name}` has unsupported dtype {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("invalid weights file: {0}")]
    Format(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A dense `f32` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Build a tensor, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, WeightsError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(WeightsError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Tensor { shape, data })
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Tensor {
            shape,
            data: vec![0.0; len],
        }
    }

    /// One-dimensional tensor over `data`.
    pub fn from_values(data: Vec<f32>) -> Self {
        Tensor {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of elements (product of the shape).
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

/// Parameter name to tensor, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightsMapping {
    tensors: BTreeMap<String, Tensor>,
}

impl WeightsMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.tensors.insert(name.into(), tensor)
    }

    pub fn with(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.insert(name, tensor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tensor)> {
        self.tensors.iter()
    }

    /// Encode as a safetensors buffer.
    pub fn to_safetensors(&self) -> Result<Vec<u8>, WeightsError> {
        let raw: Vec<(&String, &Tensor, Vec<u8>)> = self
            .tensors
            .iter()
            .map(|(name, tensor)| (name, tensor, tensor.to_le_bytes()))
            .collect();

        let mut views = Vec::with_capacity(raw.len());
        for (name, tensor, bytes) in &raw {
            let view = TensorView::new(Dtype::F32, tensor.shape.clone(), bytes)
                .map_err(|e| WeightsError::Format(e.to_string()))?;
            views.push((name.as_str(), view));
        }

        safetensors::serialize(views, &None).map_err(|e| WeightsError::Format(e.to_string()))
    }

    /// Decode a safetensors buffer. Only `F32` tensors are accepted.
    pub fn from_safetensors(buffer: &[u8]) -> Result<Self, WeightsError> {
        let file =
            SafeTensors::deserialize(buffer).map_err(|e| WeightsError::Format(e.to_string()))?;

        let mut weights = WeightsMapping::new();
        for (name, view) in file.tensors() {
            if view.dtype() != Dtype::F32 {
                return Err(WeightsError::UnsupportedDtype {
                    name,
                    dtype: format!("{:?}", view.dtype()),
                });
            }
            let data = view
                .data()
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            let tensor = Tensor::new(view.shape().to_vec(), data)?;
            weights.insert(name, tensor);
        }
        Ok(weights)
    }
}

impl FromIterator<(String, Tensor)> for WeightsMapping {
    fn from_iter<I: IntoIterator<Item = (String, Tensor)>>(iter: I) -> Self {
        WeightsMapping {
            tensors: iter.into_iter().collect(),
        }
    }
}

/// Write weights to `path` in safetensors format.
pub fn save_weights(weights: &WeightsMapping, path: &Path) -> Result<u64, WeightsError> {
    let bytes = weights.to_safetensors()?;
    std::fs::write(path, &bytes)?;
    Ok(bytes.len() as u64)
}

/// Read weights written by [`save_weights`].
pub fn load_weights(path: &Path) -> Result<WeightsMapping, WeightsError> {
    let bytes = std::fs::read(path)?;
    WeightsMapping::from_safetensors(&bytes)
}

/// Total element count across all tensors.
pub fn total_elements(weights: &WeightsMapping) -> u64 {
    weights.iter().map(|(_, t)| t.numel() as u64).sum()
}

/// Human-readable size: elements / 256, two decimals, " KB" suffix.
pub fn model_size_summary(weights: &WeightsMapping) -> String {
    format!(
        "{} KB",
        format_rounded(total_elements(weights) as f64 / ELEMENTS_PER_KB)
    )
}

/// Round to two decimals, ties to even, and print with at least one
/// fractional digit (`10.0`, `10.25`, `3.33`, `0.12` for `0.125`).
///
/// Magnitudes from `1e16` up use exponent form with an explicit sign
/// (`1e+16`); non-finite values print as `nan`, `inf` and `-inf`.
pub fn format_rounded(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let rounded = (value * 100.0).round_ties_even() / 100.0;
    let text = format!("{:?}", rounded);
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeightsMapping {
        WeightsMapping::new()
            .with("encoder.weight", Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap())
            .with("encoder.bias", Tensor::from_values(vec![0.5, -0.5]))
            .with("head.scale", Tensor::new(vec![], vec![2.5]).unwrap())
    }

    #[test]
    fn test_tensor_shape_mismatch_rejected() {
        let err = Tensor::new(vec![2, 2], vec![1.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            WeightsError::ShapeMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_total_elements() {
        assert_eq!(total_elements(&sample()), 9);
        assert_eq!(total_elements(&WeightsMapping::new()), 0);
    }

    #[test]
    fn test_size_summary_2560_elements() {
        let weights = WeightsMapping::new()
            .with("fc1.weight", Tensor::zeros(vec![32, 64]))
            .with("fc1.bias", Tensor::zeros(vec![512]));
        assert_eq!(total_elements(&weights), 2560);
        assert_eq!(model_size_summary(&weights), "10.0 KB");
    }

    #[test]
    fn test_size_summary_rounds_to_two_decimals() {
        let weights = WeightsMapping::new().with("w", Tensor::zeros(vec![1000]));
        // 1000 / 256 = 3.90625
        assert_eq!(model_size_summary(&weights), "3.91 KB");
    }

    #[test]
    fn test_format_rounded() {
        assert_eq!(format_rounded(10.0), "10.0");
        assert_eq!(format_rounded(10.25), "10.25");
        assert_eq!(format_rounded(1.0 / 3.0), "0.33");
        assert_eq!(format_rounded(-12.345678), "-12.35");
        assert_eq!(format_rounded(0.0), "0.0");
    }

    #[test]
    fn test_format_rounded_ties_to_even() {
        assert_eq!(format_rounded(0.125), "0.12");
        assert_eq!(format_rounded(0.625), "0.62");
        assert_eq!(format_rounded(0.375), "0.38");
        assert_eq!(format_rounded(-0.125), "-0.12");
    }

    #[test]
    fn test_size_summary_half_way_values() {
        let small = WeightsMapping::new().with("w", Tensor::zeros(vec![32]));
        assert_eq!(model_size_summary(&small), "0.12 KB");

        let medium = WeightsMapping::new().with("w", Tensor::zeros(vec![160]));
        assert_eq!(model_size_summary(&medium), "0.62 KB");
    }

    #[test]
    fn test_format_rounded_degenerate_values() {
        assert_eq!(format_rounded(1e16), "1e+16");
        assert_eq!(format_rounded(1e15), "1000000000000000.0");
        assert_eq!(format_rounded(f64::NAN), "nan");
        assert_eq!(format_rounded(f64::INFINITY), "inf");
        assert_eq!(format_rounded(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_safetensors_roundtrip_preserves_shapes() {
        let weights = sample();
        let bytes = weights.to_safetensors().unwrap();
        let restored = WeightsMapping::from_safetensors(&bytes).unwrap();
        assert_eq!(restored, weights);
        assert_eq!(restored.get("encoder.weight").unwrap().shape(), &[2, 3]);
        assert!(restored.get("head.scale").unwrap().shape().is_empty());
    }

    #[test]
    fn test_garbage_buffer_is_format_error() {
        let err = WeightsMapping::from_safetensors(b"definitely not safetensors").unwrap_err();
        assert!(matches!(err, WeightsError::Format(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        let written = save_weights(&sample(), &path).unwrap();
        assert_eq!(written, std::fs::metadata(&path).unwrap().len());
        assert_eq!(load_weights(&path).unwrap(), sample());
    }
}
