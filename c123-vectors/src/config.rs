use crate::VectorError;
use c123_model::SampleFormat;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// The parts of the simulation JSON that decide the sample format.
///
/// ```json
/// { "parameters": { "D": 12 }, "images": [ { "signed": "false" } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub parameters: Parameters,
    #[serde(default)]
    pub images: Vec<ImageConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameters {
    #[serde(rename = "D", deserialize_with = "number_or_string")]
    pub depth: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageConfig {
    #[serde(default, deserialize_with = "bool_or_string")]
    pub signed: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose<T> {
    Native(T),
    Text(String),
}

fn number_or_string<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    match Loose::<u32>::deserialize(de)? {
        Loose::Native(v) => Ok(v),
        Loose::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn bool_or_string<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    match Loose::<bool>::deserialize(de)? {
        Loose::Native(v) => Ok(v),
        Loose::Text(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> Result<Self, VectorError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, VectorError> {
        if !path.exists() {
            return Err(VectorError::NotFound(path.to_path_buf()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Sample format of the first image; unsigned when no image is listed.
    pub fn sample_format(&self) -> Result<SampleFormat, VectorError> {
        let signed = self.images.first().map(|img| img.signed).unwrap_or(false);
        Ok(SampleFormat::new(self.parameters.depth, signed)?)
    }
}
