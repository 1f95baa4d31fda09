#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InCubic,
    OutCubic,
    InOutCubic,
    OutElastic,
    OutBounce,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::OutElastic => {
                // Damped sine with exact endpoints.
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    let c4 = (2.0 * std::f64::consts::PI) / 3.0;
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Self::OutBounce => out_bounce(t),
        }
    }
}

// Four parabolic arcs of decreasing height.
fn out_bounce(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 6] = [
        Ease::Linear,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::OutElastic,
        Ease::OutBounce,
    ];

    #[test]
    fn endpoints_are_stable() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?} at 0");
            assert_eq!(ease.apply(1.0), 1.0, "{ease:?} at 1");
        }
    }

    #[test]
    fn input_is_clamped() {
        for ease in ALL {
            assert_eq!(ease.apply(-0.5), 0.0);
            assert_eq!(ease.apply(1.5), 1.0);
        }
    }

    #[test]
    fn monotonic_spot_check() {
        for ease in [
            Ease::Linear,
            Ease::InCubic,
            Ease::OutCubic,
            Ease::InOutCubic,
        ] {
            let a = ease.apply(0.25);
            let b = ease.apply(0.5);
            let c = ease.apply(0.75);
            assert!(a < b, "{ease:?}");
            assert!(b < c, "{ease:?}");
        }
    }

    #[test]
    fn elastic_overshoots_then_settles() {
        // The damped sine passes above 1.0 on its way in.
        let overshoot = (1..100)
            .map(|i| Ease::OutElastic.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(overshoot > 1.0);
        assert!((Ease::OutElastic.apply(0.99) - 1.0).abs() < 0.01);
    }

    #[test]
    fn bounce_stays_in_unit_range() {
        for i in 0..=100 {
            let v = Ease::OutBounce.apply(i as f64 / 100.0);
            assert!((0.0..=1.0).contains(&v), "t={i} v={v}");
        }
        // The first arc lands on 1 at its seam.
        assert!(Ease::OutBounce.apply(1.0 / 2.75) > 0.99);
    }
}
