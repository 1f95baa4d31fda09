use crate::ease::Ease;

/// A keyframe payload: a real number for interpolable properties, or an
/// opaque string (colors, shadow specs) that steps instead of blending.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Numeric(f64),
    Discrete(String),
}

impl Value {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Discrete(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Discrete(v.to_string())
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Value at eased progress `t` between two keyframe payloads.
///
/// Numeric pairs interpolate through the easing curve. Any pair involving a
/// discrete value is a step function: `a` until `t` reaches 1, then `b`.
pub fn interpolate(a: &Value, b: &Value, t: f64, ease: Ease) -> Value {
    match (a, b) {
        (Value::Numeric(av), Value::Numeric(bv)) => Value::Numeric(lerp(*av, *bv, ease.apply(t))),
        _ => {
            if t < 1.0 {
                a.clone()
            } else {
                b.clone()
            }
        }
    }
}
