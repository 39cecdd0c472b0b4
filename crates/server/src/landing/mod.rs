//! Landing page renderer.
//!
//! Turns the product data a client posts to `/api/generate` into:
//!
//! - a self-contained HTML document (inline CSS and a small variant switcher)
//! - a Liquid section with the same markup, reading its texts from
//!   `section.settings`
//! - the section's `{% schema %}` JSON
//!
//! Rendering is pure. The only input it rejects is a malformed variant color.

mod filters;
mod schema;

use askama::Template;
use rust_decimal::Decimal;
use section_forge_core::{ColorError, HexColor, Price};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use filters::escape_json_braces;
pub use schema::section_schema;

/// Shown when the request carries no product image.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/800x1000/png?text=Product";

/// Shown when the request carries no brand logo.
pub const PLACEHOLDER_LOGO: &str = "https://placehold.co/160x48/png?text=Logo";

/// Sizes offered when the request lists none.
pub const DEFAULT_SIZES: [&str; 4] = ["S", "M", "L", "XL"];

/// Gradient start shade, in percent.
const GRADIENT_LIGHTEN: f64 = 30.0;
/// Gradient end shade, in percent.
const GRADIENT_DARKEN: f64 = 20.0;

const DEFAULT_PRODUCT_NAME: &str = "Your Product";
const DEFAULT_BUTTON_LABEL: &str = "Add to cart";

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur while rendering a landing page.
#[derive(Debug, Error)]
pub enum LandingError {
    /// A variant's color is not a hex color.
    #[error("variant {index} has an invalid color {value:?}: {source}")]
    InvalidColor {
        index: usize,
        value: String,
        #[source]
        source: ColorError,
    },

    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// Request types
// =============================================================================

/// A price sent either as a JSON string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl PriceInput {
    /// Formatted price, or the trimmed input when it is not a number.
    fn display(&self) -> String {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        Price::parse(&raw).map_or(raw, |price| price.to_string())
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    pub product_name: Option<String>,
    pub product_features: Option<String>,
    pub product_price: Option<PriceInput>,
    pub product_category: Option<String>,
    pub target_audience: Option<String>,
    pub design_description: Option<String>,
    pub shipping_option: Option<String>,
    pub custom_shipping_price: Option<PriceInput>,
    pub custom_offer: Option<String>,
    pub product_images: Vec<String>,
    pub brand_logo: Option<String>,
    pub variants: Option<VariantsInput>,
}

/// Variant block of a generate request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VariantsInput {
    pub colors: Vec<ColorInput>,
    pub sizes: Vec<String>,
}

/// One color variant as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub image: Option<String>,
}

// =============================================================================
// Page model
// =============================================================================

/// A color variant with its derived gradient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub name: String,
    pub hex: HexColor,
    pub image: String,
    pub gradient_start: HexColor,
    pub gradient_end: HexColor,
}

impl Variant {
    /// Derive a variant's gradient from its color.
    #[must_use]
    pub fn from_color(name: String, hex: HexColor, image: String) -> Self {
        Self {
            name,
            hex,
            image,
            gradient_start: hex.lighten(GRADIENT_LIGHTEN),
            gradient_end: hex.darken(GRADIENT_DARKEN),
        }
    }

    /// The variant synthesized when the client sends none.
    #[must_use]
    pub fn signature(image: String) -> Self {
        use section_forge_core::Rgb;
        Self {
            name: "Signature".to_string(),
            hex: HexColor::from_rgb(Rgb::new(0x63, 0x66, 0xF1)),
            image,
            gradient_start: HexColor::from_rgb(Rgb::new(0xA5, 0xB4, 0xFC)),
            gradient_end: HexColor::from_rgb(Rgb::new(0x43, 0x38, 0xCA)),
        }
    }
}

/// Everything the templates need, with defaults applied.
#[derive(Debug, Clone)]
pub struct LandingPage {
    pub name: String,
    pub price: String,
    pub features: Vec<String>,
    pub category: Option<String>,
    pub audience: Option<String>,
    pub design_notes: Option<String>,
    pub shipping: Option<String>,
    pub offer: Option<String>,
    pub images: Vec<String>,
    pub logo: String,
    pub variants: Vec<Variant>,
    pub sizes: Vec<String>,
    pub button_label: String,
}

/// Output of [`LandingPage::render`].
#[derive(Debug, Clone, Serialize)]
pub struct RenderedSection {
    pub html: String,
    pub liquid_code: String,
    pub schema: serde_json::Value,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a feature blob on newlines and commas.
#[must_use]
pub fn split_features(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(|f| f.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

fn shipping_line(option: Option<&str>, custom_price: Option<&PriceInput>) -> Option<String> {
    match option.map(|o| o.trim().to_ascii_lowercase()).as_deref() {
        Some("free") => Some("Free shipping".to_string()),
        Some("standard") => Some("Standard shipping".to_string()),
        Some("custom") => Some(match custom_price {
            Some(price) => format!("Shipping: {}", price.display()),
            None => "Shipping calculated at checkout".to_string(),
        }),
        _ => None,
    }
}

impl LandingPage {
    /// Apply defaults and validate variant colors.
    ///
    /// # Errors
    ///
    /// Returns `LandingError::InvalidColor` for the first variant whose hex
    /// does not parse.
    pub fn from_request(req: GenerateRequest) -> Result<Self, LandingError> {
        let images: Vec<String> = req
            .product_images
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        let images = if images.is_empty() {
            vec![PLACEHOLDER_IMAGE.to_string()]
        } else {
            images
        };
        let primary_image = images
            .first()
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        let VariantsInput { colors, sizes } = req.variants.unwrap_or_default();

        let mut variants = Vec::with_capacity(colors.len().max(1));
        for (index, color) in colors.into_iter().enumerate() {
            let hex = HexColor::parse(&color.hex).map_err(|source| LandingError::InvalidColor {
                index,
                value: color.hex.clone(),
                source,
            })?;
            let image = non_blank(color.image)
                .or_else(|| images.get(index).cloned())
                .unwrap_or_else(|| primary_image.clone());
            let name = if color.name.trim().is_empty() {
                hex.to_string()
            } else {
                color.name.trim().to_string()
            };
            variants.push(Variant::from_color(name, hex, image));
        }
        if variants.is_empty() {
            variants.push(Variant::signature(primary_image));
        }

        let sizes: Vec<String> = sizes
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let sizes = if sizes.is_empty() {
            DEFAULT_SIZES.iter().map(ToString::to_string).collect()
        } else {
            sizes
        };

        Ok(Self {
            name: non_blank(req.product_name).unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
            price: req
                .product_price
                .as_ref()
                .map_or_else(|| Price::new(Decimal::ZERO).to_string(), PriceInput::display),
            features: req
                .product_features
                .as_deref()
                .map(split_features)
                .unwrap_or_default(),
            category: non_blank(req.product_category),
            audience: non_blank(req.target_audience),
            design_notes: non_blank(req.design_description),
            shipping: shipping_line(
                req.shipping_option.as_deref(),
                req.custom_shipping_price.as_ref(),
            ),
            offer: non_blank(req.custom_offer),
            images,
            logo: non_blank(req.brand_logo).unwrap_or_else(|| PLACEHOLDER_LOGO.to_string()),
            variants,
            sizes,
            button_label: DEFAULT_BUTTON_LABEL.to_string(),
        })
    }

    /// The first (initially active) variant.
    #[must_use]
    pub fn first_variant(&self) -> Variant {
        self.variants
            .first()
            .cloned()
            .unwrap_or_else(|| Variant::signature(PLACEHOLDER_IMAGE.to_string()))
    }

    /// Page indicator for the `n`th (0-indexed) variant, e.g. `01 — 03`.
    #[must_use]
    pub fn indicator(&self, n: usize) -> String {
        format!("{:02} — {:02}", n + 1, self.variants.len())
    }

    /// Variant data for the client-side switcher, safe inside `<script>`.
    fn variants_json(&self) -> String {
        let json = serde_json::to_string(&self.variants).unwrap_or_else(|_| "[]".to_string());
        json.replace('<', "\\u003c")
            .replace('>', "\\u003e")
            .replace('&', "\\u0026")
    }

    /// Render HTML, Liquid and schema.
    ///
    /// # Errors
    ///
    /// Returns `LandingError::Template` if a template fails to render.
    pub fn render(&self) -> Result<RenderedSection, LandingError> {
        let variants_json = self.variants_json();
        let indicator = self.indicator(0);
        let variant = self.first_variant();

        let html = PageTemplate {
            page: self,
            variant: &variant,
            indicator: &indicator,
            variants_json: &variants_json,
        }
        .render()?;

        let liquid_code = SectionTemplate {
            page: self,
            variant: &variant,
            indicator: &indicator,
            variants_json: &variants_json,
        }
        .render()?;

        Ok(RenderedSection {
            html,
            liquid_code,
            schema: section_schema(self),
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "landing/page.html")]
struct PageTemplate<'a> {
    page: &'a LandingPage,
    variant: &'a Variant,
    indicator: &'a str,
    variants_json: &'a str,
}

#[derive(Template)]
#[template(path = "landing/section.liquid", escape = "none")]
struct SectionTemplate<'a> {
    page: &'a LandingPage,
    variant: &'a Variant,
    indicator: &'a str,
    variants_json: &'a str,
}
