use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{
    AspectRatio, GeneratedImage, ImageGenerator, ProviderError, StructuredRequest, TextGenerator,
};

/// Offline text backend: answers every request with its contract's sample payload.
pub struct DryrunTextProvider;

impl TextGenerator for DryrunTextProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &StructuredRequest) -> Result<String, ProviderError> {
        serde_json::to_string(&request.contract.sample()).map_err(|err| {
            ProviderError::InvalidResponse {
                provider: "Dryrun",
                reason: err.to_string(),
            }
        })
    }
}

/// Offline image backend: a solid PNG whose color is derived from the prompt.
pub struct DryrunImageProvider;

impl ImageGenerator for DryrunImageProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_image(
        &self,
        prompt: &str,
        aspect: AspectRatio,
    ) -> Result<GeneratedImage, ProviderError> {
        let digest = prompt_digest(prompt);
        debug!(digest = %hex::encode(&digest[..4]), aspect = aspect.ratio(), "dryrun image");
        let (width, height) = aspect.dims();
        let mut image = RgbImage::new(width, height);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([digest[0], digest[1], digest[2]]);
        }
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| ProviderError::InvalidResponse {
                provider: "Dryrun",
                reason: format!("png encode failed: {err}"),
            })?;
        Ok(GeneratedImage {
            bytes,
            mime_type: "image/png".to_string(),
        })
    }
}

fn prompt_digest(prompt: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use becom_contracts::schema::ContractKind;
    use serde_json::Value;

    use super::*;

    #[test]
    fn dryrun_text_satisfies_every_contract() -> anyhow::Result<()> {
        for kind in ContractKind::ALL {
            let contract = kind.contract();
            let raw = DryrunTextProvider.generate(&StructuredRequest {
                system_directive: String::new(),
                parts: Vec::new(),
                contract: contract.clone(),
                temperature: 0.7,
            })?;
            let value: Value = serde_json::from_str(&raw)?;
            contract.validate(&value)?;
        }
        Ok(())
    }

    #[test]
    fn dryrun_image_is_a_png_of_requested_shape() -> anyhow::Result<()> {
        let image = DryrunImageProvider.generate_image("a rocket", AspectRatio::Wide)?;
        assert_eq!(image.mime_type, "image/png");
        let decoded = image::load_from_memory_with_format(&image.bytes, ImageFormat::Png)?;
        assert_eq!((decoded.width(), decoded.height()), AspectRatio::Wide.dims());

        let again = DryrunImageProvider.generate_image("a rocket", AspectRatio::Wide)?;
        assert_eq!(image, again);
        Ok(())
    }
}
