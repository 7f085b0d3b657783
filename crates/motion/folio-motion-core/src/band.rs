//! Viewport bands: where a trigger starts and ends.
//!
//! A [`BandEdge`] pairs a point on the element with a line in the viewport,
//! written as `"<element> <viewport>"`: `"top 70%"` is reached when the
//! element's top edge meets the line 70% down the viewport.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;
use crate::geometry::{Rect, Viewport};

/// Offset along an extent (element height or viewport height).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    /// Percentage of the extent, measured from its top.
    Percent(f32),
    /// Absolute pixels from the top of the extent.
    Pixels(f32),
}

impl Anchor {
    #[inline]
    pub fn resolve(&self, extent: f32) -> f32 {
        match *self {
            Anchor::Top => 0.0,
            Anchor::Center => extent * 0.5,
            Anchor::Bottom => extent,
            Anchor::Percent(p) => extent * p / 100.0,
            Anchor::Pixels(px) => px,
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "top" => Some(Anchor::Top),
            "center" => Some(Anchor::Center),
            "bottom" => Some(Anchor::Bottom),
            t => {
                if let Some(p) = t.strip_suffix('%') {
                    p.parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(Anchor::Percent)
                } else {
                    t.strip_suffix("px")
                        .unwrap_or(t)
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(Anchor::Pixels)
                }
            }
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Top => f.write_str("top"),
            Anchor::Center => f.write_str("center"),
            Anchor::Bottom => f.write_str("bottom"),
            Anchor::Percent(p) => write!(f, "{p}%"),
            Anchor::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// One edge of a band: element point meets viewport line.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BandEdge {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl BandEdge {
    pub const fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// Document scroll offset at which this edge is reached.
    fn scroll_offset(&self, rect: &Rect, viewport: &Viewport) -> f32 {
        let element_doc_y = rect.top + viewport.scroll_y + self.element.resolve(rect.height);
        element_doc_y - self.viewport.resolve(viewport.height)
    }
}

impl FromStr for BandEdge {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::InvalidBand {
            input: s.to_string(),
        };
        let mut tokens = s.split_whitespace();
        let first = tokens.next().ok_or_else(invalid)?;
        let element = Anchor::parse_token(first).ok_or_else(invalid)?;
        let viewport = match tokens.next() {
            Some(t) => Anchor::parse_token(t).ok_or_else(invalid)?,
            // "center" means "center center"
            None => element,
        };
        if tokens.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { element, viewport })
    }
}

impl TryFrom<String> for BandEdge {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BandEdge> for String {
    fn from(edge: BandEdge) -> Self {
        edge.to_string()
    }
}

impl fmt::Display for BandEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

/// Start and end edges of a trigger.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollBand {
    pub start: BandEdge,
    pub end: BandEdge,
}

impl ScrollBand {
    pub fn new(start: BandEdge, end: BandEdge) -> Self {
        Self { start, end }
    }

    /// Unclamped progress; below 0 before the start edge, above 1 past the end edge.
    pub fn raw_progress(&self, rect: &Rect, viewport: &Viewport) -> f32 {
        let start = self.start.scroll_offset(rect, viewport);
        let end = self.end.scroll_offset(rect, viewport);
        let span = end - start;
        let scrolled = viewport.scroll_y - start;
        if span.abs() <= f32::EPSILON {
            // Degenerate band: a step at the start edge.
            return if scrolled >= 0.0 { 1.0 } else { -1.0 };
        }
        scrolled / span
    }

    /// Progress clamped to `[0, 1]`.
    pub fn progress(&self, rect: &Rect, viewport: &Viewport) -> f32 {
        self.raw_progress(rect, viewport).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(s: &str) -> BandEdge {
        s.parse().unwrap()
    }

    #[test]
    fn parses_keywords_percent_and_pixels() {
        assert_eq!(edge("top 70%"), BandEdge::new(Anchor::Top, Anchor::Percent(70.0)));
        assert_eq!(
            edge("bottom bottom"),
            BandEdge::new(Anchor::Bottom, Anchor::Bottom)
        );
        assert_eq!(edge("center"), BandEdge::new(Anchor::Center, Anchor::Center));
        assert_eq!(edge("top 120px"), BandEdge::new(Anchor::Top, Anchor::Pixels(120.0)));
        assert!("middle 10%".parse::<BandEdge>().is_err());
        assert!("top 10% extra".parse::<BandEdge>().is_err());
        assert!("".parse::<BandEdge>().is_err());
    }

    #[test]
    fn serde_uses_shorthand() {
        let e = edge("bottom 10%");
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "\"bottom 10%\"");
        let back: BandEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert!(serde_json::from_str::<BandEdge>("\"sideways\"").is_err());
    }

    #[test]
    fn about_me_band_progress() {
        // Element 1000px tall starting 1200px down the document; viewport 1000px.
        let band = ScrollBand::new(edge("top 70%"), edge("bottom bottom"));
        let at = |scroll_y: f32| {
            let vp = Viewport {
                width: 1280.0,
                height: 1000.0,
                scroll_y,
                document_height: 5000.0,
            };
            let rect = Rect::new(1200.0 - scroll_y, 0.0, 1280.0, 1000.0);
            band.progress(&rect, &vp)
        };
        // start = 1200 - 700 = 500, end = 2200 - 1000 = 1200
        assert_eq!(at(0.0), 0.0);
        assert_eq!(at(500.0), 0.0);
        assert!((at(850.0) - 0.5).abs() < 1e-6);
        assert_eq!(at(1200.0), 1.0);
        assert_eq!(at(4000.0), 1.0);
    }

    #[test]
    fn degenerate_band_is_a_step() {
        let band = ScrollBand::new(edge("top top"), edge("top top"));
        let vp = Viewport {
            width: 100.0,
            height: 100.0,
            scroll_y: 0.0,
            document_height: 1000.0,
        };
        assert_eq!(band.raw_progress(&Rect::new(50.0, 0.0, 10.0, 10.0), &vp), -1.0);
        assert_eq!(band.raw_progress(&Rect::new(0.0, 0.0, 10.0, 10.0), &vp), 1.0);
    }
}
