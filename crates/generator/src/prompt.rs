//! The instruction sent alongside the product photo.

use serde::Deserialize;

use crate::claude::{ContentBlock, ImageSource, Message};

/// Body of `POST /generate`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    pub image_base64: String,
    pub product_name: String,
    pub product_features: String,
    pub product_price: Option<serde_json::Value>,
}

impl PageRequest {
    /// Names of required fields that are absent or blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("imageBase64", &self.image_base64),
            ("productName", &self.product_name),
            ("productFeatures", &self.product_features),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    fn price(&self) -> Option<String> {
        match self.product_price.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The full instruction text.
    #[must_use]
    pub fn instruction(&self) -> String {
        let price = self
            .price()
            .map_or_else(String::new, |p| format!("Price: {p}\n"));

        format!(
            "You are an expert e-commerce designer. Using the attached product photo, \
write a complete, self-contained HTML landing page for this product.\n\
\n\
Product: {name}\n\
{price}\
Features:\n{features}\n\
\n\
Requirements:\n\
- Derive the color palette from the product photo and use it throughout.\n\
- Put all CSS in a single <style> element; no external stylesheets, fonts or scripts.\n\
- Include a hero with the product name, the price if given, a feature list and a buy button.\n\
- The layout must work on mobile and desktop.\n\
- Use a placeholder <img> with alt text where the product image belongs.\n\
\n\
Reply with the HTML document only, starting with <!DOCTYPE html>, with no commentary \
and no Markdown code fences.",
            name = self.product_name.trim(),
            features = self.product_features.trim(),
        )
    }

    /// The single user turn: image first, then the instruction.
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message::user(vec![
            ContentBlock::Image {
                source: ImageSource::from_base64(&self.image_base64),
            },
            ContentBlock::Text {
                text: self.instruction(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> PageRequest {
        serde_json::from_value(value).expect("request")
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            request(json!({})).missing_fields(),
            vec!["imageBase64", "productName", "productFeatures"]
        );
        assert_eq!(
            request(json!({"imageBase64": "abc", "productName": " ", "productFeatures": "x"}))
                .missing_fields(),
            vec!["productName"]
        );
    }

    #[test]
    fn test_instruction_mentions_product() {
        let req = request(json!({
            "imageBase64": "abc",
            "productName": "Trail Lamp",
            "productFeatures": "Waterproof, 300 lumens",
            "productPrice": 49.5
        }));
        let text = req.instruction();
        assert!(text.contains("Product: Trail Lamp"));
        assert!(text.contains("Price: 49.5"));
        assert!(text.contains("Waterproof, 300 lumens"));
        assert!(text.contains("color palette"));
    }

    #[test]
    fn test_instruction_omits_blank_price() {
        let req = request(json!({
            "imageBase64": "abc",
            "productName": "Lamp",
            "productFeatures": "Bright",
            "productPrice": ""
        }));
        assert!(!req.instruction().contains("Price:"));
    }

    #[test]
    fn test_message_puts_image_first() {
        let req = request(json!({
            "imageBase64": "data:image/webp;base64,UklGRg==",
            "productName": "Lamp",
            "productFeatures": "Bright"
        }));
        let message = req.to_message();
        assert_eq!(message.role, "user");
        assert!(matches!(
            message.content.first(),
            Some(ContentBlock::Image { source }) if source.media_type == "image/webp"
        ));
        assert!(matches!(message.content.get(1), Some(ContentBlock::Text { .. })));
    }
}
