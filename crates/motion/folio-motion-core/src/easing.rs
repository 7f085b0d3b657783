//! Easing curves and scalar interpolation.
//!
//! Names follow the shorthand used in the site's choreography:
//! `"none"`, `"power2.out"`, `"sine.inOut"`, `"back.out(1.7)"`,
//! `"cubic-bezier(0.42,0,0.58,1)"`. Every curve maps 0 → 0 and 1 → 1.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Default overshoot for `back` curves.
pub const BACK_OVERSHOOT: f32 = 1.70158;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Which end of the curve carries the acceleration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EaseKind {
    In,
    Out,
    InOut,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    /// `powerN`: polynomial of degree N + 1 (power1 = quad ... power4 = quint).
    Power { degree: u8, kind: EaseKind },
    Sine(EaseKind),
    Expo(EaseKind),
    Circ(EaseKind),
    Back { kind: EaseKind, overshoot: f32 },
    CubicBezier([f32; 4]),
}

impl Easing {
    /// Map linear progress `t` to eased progress.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match *self {
            Easing::Linear => t,
            Easing::Power { degree, kind } => {
                let exp = i32::from(degree) + 1;
                shape(kind, t, |x| x.powi(exp))
            }
            Easing::Sine(kind) => shape(kind, t, |x| 1.0 - (x * PI * 0.5).cos()),
            Easing::Expo(kind) => shape(kind, t, |x| {
                if x == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * x - 10.0)
                }
            }),
            Easing::Circ(kind) => shape(kind, t, |x| 1.0 - (1.0 - x * x).max(0.0).sqrt()),
            Easing::Back { kind, overshoot } => shape(kind, t, |x| {
                (overshoot + 1.0) * x * x * x - overshoot * x * x
            }),
            Easing::CubicBezier([x1, y1, x2, y2]) => bezier_ease_t(t, x1, y1, x2, y2),
        }
    }
}

/// Derive out / in-out variants from an ease-in curve.
#[inline]
fn shape(kind: EaseKind, t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    match kind {
        EaseKind::In => ease_in(t),
        EaseKind::Out => 1.0 - ease_in(1.0 - t),
        EaseKind::InOut => {
            if t < 0.5 {
                ease_in(2.0 * t) * 0.5
            } else {
                1.0 - ease_in(2.0 * (1.0 - t)) * 0.5
            }
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Invert the x bezier by binary search, then evaluate y.
#[inline]
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x1 == y1 && x2 == y2 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

fn parse_kind(s: &str) -> Option<EaseKind> {
    match s {
        "in" => Some(EaseKind::In),
        "out" => Some(EaseKind::Out),
        "inout" => Some(EaseKind::InOut),
        _ => None,
    }
}

fn kind_str(kind: EaseKind) -> &'static str {
    match kind {
        EaseKind::In => "in",
        EaseKind::Out => "out",
        EaseKind::InOut => "inOut",
    }
}

fn parse_args(s: &str) -> Option<Vec<f32>> {
    let inner = s.strip_prefix('(')?.strip_suffix(')')?;
    inner
        .split(',')
        .map(|p| p.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect()
}

impl FromStr for Easing {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::InvalidEasing {
            input: s.to_string(),
        };
        let lower = s.trim().to_ascii_lowercase();
        if lower == "none" || lower == "linear" || lower == "power0" {
            return Ok(Easing::Linear);
        }
        if let Some(args) = lower.strip_prefix("cubic-bezier") {
            return match parse_args(args).as_deref() {
                Some(&[x1, y1, x2, y2]) => Ok(Easing::CubicBezier([x1, y1, x2, y2])),
                _ => Err(invalid()),
            };
        }

        // family[.kind][(args)]
        let (head, args) = match lower.find('(') {
            Some(idx) => (&lower[..idx], Some(&lower[idx..])),
            None => (lower.as_str(), None),
        };
        let (family, kind) = match head.split_once('.') {
            Some((family, kind)) => (family, parse_kind(kind).ok_or_else(invalid)?),
            // GSAP defaults a bare family to its "out" flavour
            None => (head, EaseKind::Out),
        };

        let easing = match family {
            "power1" | "quad" => Easing::Power { degree: 1, kind },
            "power2" | "cubic" => Easing::Power { degree: 2, kind },
            "power3" | "quart" => Easing::Power { degree: 3, kind },
            "power4" | "quint" | "strong" => Easing::Power { degree: 4, kind },
            "sine" => Easing::Sine(kind),
            "expo" => Easing::Expo(kind),
            "circ" => Easing::Circ(kind),
            "back" => {
                let overshoot = match args {
                    None => BACK_OVERSHOOT,
                    Some(a) => match parse_args(a).as_deref() {
                        Some(&[o]) => o,
                        _ => return Err(invalid()),
                    },
                };
                return Ok(Easing::Back { kind, overshoot });
            }
            _ => return Err(invalid()),
        };
        if args.is_some() {
            return Err(invalid());
        }
        Ok(easing)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Easing::Linear => f.write_str("none"),
            Easing::Power { degree, kind } => write!(f, "power{degree}.{}", kind_str(kind)),
            Easing::Sine(kind) => write!(f, "sine.{}", kind_str(kind)),
            Easing::Expo(kind) => write!(f, "expo.{}", kind_str(kind)),
            Easing::Circ(kind) => write!(f, "circ.{}", kind_str(kind)),
            Easing::Back { kind, overshoot } => {
                write!(f, "back.{}({overshoot})", kind_str(kind))
            }
            Easing::CubicBezier([x1, y1, x2, y2]) => {
                write!(f, "cubic-bezier({x1},{y1},{x2},{y2})")
            }
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}
