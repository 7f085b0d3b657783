//! Animatable properties and committed values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A style channel on an element. All values are unitless f32; the host
/// decides units (`x`/`y` in px, `rotation` in degrees, `blur` in px, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Property {
    X,
    Y,
    Opacity,
    Scale,
    ScaleX,
    ScaleY,
    Rotation,
    Blur,
    WidthPercent,
    Custom(String),
}

impl Property {
    pub fn as_str(&self) -> &str {
        match self {
            Property::X => "x",
            Property::Y => "y",
            Property::Opacity => "opacity",
            Property::Scale => "scale",
            Property::ScaleX => "scaleX",
            Property::ScaleY => "scaleY",
            Property::Rotation => "rotation",
            Property::Blur => "blur",
            Property::WidthPercent => "widthPercent",
            Property::Custom(name) => name,
        }
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        match s {
            "x" => Property::X,
            "y" => Property::Y,
            "opacity" | "autoAlpha" => Property::Opacity,
            "scale" => Property::Scale,
            "scaleX" => Property::ScaleX,
            "scaleY" => Property::ScaleY,
            "rotation" | "rotate" => Property::Rotation,
            "blur" => Property::Blur,
            "widthPercent" => Property::WidthPercent,
            other => Property::Custom(other.to_string()),
        }
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        Property::from(s.as_str())
    }
}

impl From<Property> for String {
    fn from(p: Property) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One property set handed to the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub property: Property,
    pub value: f32,
}

impl PropertyValue {
    pub fn new(property: Property, value: f32) -> Self {
        Self { property, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_custom_names() {
        assert_eq!(Property::from("opacity"), Property::Opacity);
        assert_eq!(Property::from("autoAlpha"), Property::Opacity);
        assert_eq!(
            Property::from("letterSpacing"),
            Property::Custom("letterSpacing".into())
        );
        let json = serde_json::to_string(&Property::ScaleX).unwrap();
        assert_eq!(json, "\"scaleX\"");
    }
}
