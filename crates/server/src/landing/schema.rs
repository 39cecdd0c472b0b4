//! `{% schema %}` document for the generated Liquid section.

use serde_json::{Value, json};

use super::LandingPage;

/// Shopify rejects section names longer than this.
const MAX_SECTION_NAME: usize = 25;

fn section_name(product: &str) -> String {
    let name = format!("Landing: {product}");
    if name.chars().count() <= MAX_SECTION_NAME {
        return name;
    }
    let mut short: String = name.chars().take(MAX_SECTION_NAME - 1).collect();
    short.push('…');
    short
}

/// Build the schema for a rendered page.
///
/// Every text the Liquid template reads from `section.settings` is declared
/// here, with the request's values as defaults.
#[must_use]
pub fn section_schema(page: &LandingPage) -> Value {
    let name = section_name(&page.name);

    let mut offer = json!({
        "type": "text",
        "id": "offer_text",
        "label": "Offer banner",
        "info": "Leave empty to hide the banner",
    });
    if let (Some(text), Some(obj)) = (&page.offer, offer.as_object_mut()) {
        obj.insert("default".to_string(), Value::String(text.clone()));
    }

    json!({
        "name": name,
        "tag": "section",
        "class": "landing-section",
        "settings": [
            {
                "type": "text",
                "id": "product_name",
                "label": "Product name",
                "default": page.name,
            },
            {
                "type": "text",
                "id": "product_price",
                "label": "Price",
                "default": page.price,
            },
            {
                "type": "text",
                "id": "button_label",
                "label": "Button label",
                "default": page.button_label,
            },
            offer,
        ],
        "presets": [
            { "name": name }
        ],
    })
}
