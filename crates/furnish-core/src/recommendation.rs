//! Recommended products and the helpers that make their raw fields safe to render.
//!
//! The backend is loose about field shapes: prices arrive as numbers or as
//! currency-formatted strings, and image URLs sometimes carry a whole
//! stringified list. Nothing here ever fails; bad data becomes a sentinel.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shown in place of a price that is missing or could not be parsed
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// Image used when a recommendation has no usable image URL
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://placehold.co/400x300/6366f1/ffffff?text=Image+Unavailable";

const TITLE_DISPLAY_CHARS: usize = 50;

/// Price as it comes over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// One suggested product returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub creative_description: String,
}

impl Recommendation {
    pub fn price_value(&self) -> Option<f64> {
        normalize_price(self.price.as_ref())
    }

    pub fn display_price(&self) -> String {
        format_price(self.price_value())
    }

    pub fn image(&self) -> Option<String> {
        normalize_image_url(self.image_url.as_deref())
    }

    pub fn image_or_placeholder(&self) -> String {
        self.image()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string())
    }

    pub fn display_title(&self) -> String {
        display_title(&self.title)
    }
}

fn price_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[$€£¥]\s*|,").expect("valid price regex"))
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?(?:\d+(?:\.\d+)?|\.\d+)").expect("valid number regex"))
}

fn url_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\[\]'"]"#).expect("valid url regex"))
}

/// Parse a raw price into a number, or `None` when it is unavailable.
///
/// Text prices keep their leading number, so `"$24.99 - $39.99"` reads as
/// `24.99`. A bare numeric `0` is unavailable.
pub fn normalize_price(raw: Option<&RawPrice>) -> Option<f64> {
    let value = match raw? {
        RawPrice::Number(n) if *n == 0.0 => return None,
        RawPrice::Number(n) => *n,
        RawPrice::Text(s) => {
            let cleaned = price_noise().replace_all(s.trim(), "");
            let number = leading_number().find(cleaned.trim())?;
            number.as_str().parse::<f64>().ok()?
        }
        RawPrice::Other(_) => return None,
    };

    value.is_finite().then_some(value)
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${:.2}", p),
        None => PRICE_UNAVAILABLE.to_string(),
    }
}

/// Take the first candidate out of a packed image URL field.
///
/// `"['http://a.png', 'http://b.png']"` becomes `"http://a.png"`.
pub fn normalize_image_url(raw: Option<&str>) -> Option<String> {
    let first = raw?.split(',').next().unwrap_or_default();
    let cleaned = url_punctuation().replace_all(first, "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

pub fn display_title(title: &str) -> String {
    if title.chars().count() > TITLE_DISPLAY_CHARS {
        let cut: String = title.chars().take(TITLE_DISPLAY_CHARS).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}
