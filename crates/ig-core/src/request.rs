use serde::Serialize;
use crate::error::RequestError;

pub const MIN_DIMENSION: u32 = 256;
pub const MAX_DIMENSION: u32 = 1024;
pub const DIMENSION_STEP: u32 = 64;
pub const DEFAULT_DIMENSION: u32 = 512;

/// A validated text-to-image request, ready to be sent to `/images/generate`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    width: u32,
    height: u32,
}

impl GenerationRequest {
    /// Trims the prompt and checks both dimensions against the form bounds
    pub fn new(prompt: impl AsRef<str>, width: u32, height: u32) -> Result<Self, RequestError> {
        let prompt = prompt.as_ref().trim();
        if prompt.is_empty() {
            return Err(RequestError::EmptyPrompt);
        }

        check_dimension("width", width)?;
        check_dimension("height", height)?;

        Ok(Self {
            prompt: prompt.to_string(),
            width,
            height,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn check_dimension(name: &'static str, value: u32) -> Result<(), RequestError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(RequestError::DimensionOutOfRange { name, value });
    }
    if value % DIMENSION_STEP != 0 {
        return Err(RequestError::DimensionNotAligned { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prompt_is_trimmed() {
        let req = GenerationRequest::new("  a red fox  ", 512, 768).unwrap();
        assert_eq!(req.prompt(), "a red fox");
        assert_eq!((req.width(), req.height()), (512, 768));
    }

    #[test]
    fn test_blank_prompt_rejected() {
        assert_eq!(
            GenerationRequest::new(" \n\t", 512, 512),
            Err(RequestError::EmptyPrompt)
        );
    }

    #[test]
    fn test_dimension_bounds() {
        assert!(GenerationRequest::new("cat", MIN_DIMENSION, MAX_DIMENSION).is_ok());
        assert_eq!(
            GenerationRequest::new("cat", 192, 512),
            Err(RequestError::DimensionOutOfRange { name: "width", value: 192 })
        );
        assert_eq!(
            GenerationRequest::new("cat", 512, 1088),
            Err(RequestError::DimensionOutOfRange { name: "height", value: 1088 })
        );
    }

    #[test]
    fn test_dimension_step() {
        assert_eq!(
            GenerationRequest::new("cat", 500, 512),
            Err(RequestError::DimensionNotAligned { name: "width", value: 500 })
        );
    }

    #[test]
    fn test_wire_shape() {
        let req = GenerationRequest::new("cat", 512, 256).unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "cat", "width": 512, "height": 256 }));
    }
}
