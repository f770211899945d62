use crate::core::Fps;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    Spring,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            // Spring with no parameters degrades to the ease-out curve; the
            // resolver routes parameterized springs through spring_progress.
            Self::Spring => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpringParams {
    pub damping: f64,
    pub mass: f64,
    pub stiffness: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            damping: 16.0,
            mass: 0.9,
            stiffness: 120.0,
        }
    }
}

// Decay threshold at which the oscillation counts as settled.
const SETTLE_EPSILON: f64 = 0.005;

/// Damped-harmonic-oscillator displacement from rest (0) toward target (1).
///
/// With `total_frames > 0` the oscillator's natural settle time is rescaled so
/// the motion completes within `total_frames` ticks; otherwise `local_frame`
/// advances the raw clock at `fps`. Stateless and deterministic.
pub fn spring_progress(
    local_frame: u64,
    total_frames: u64,
    fps: Fps,
    params: SpringParams,
) -> f64 {
    let mass = params.mass.max(1e-6);
    let stiffness = params.stiffness.max(1e-6);
    let damping = params.damping.max(0.0);

    let omega0 = (stiffness / mass).sqrt();
    let zeta = damping / (2.0 * (stiffness * mass).sqrt());

    let t = if total_frames > 0 {
        let settle = natural_settle_secs(omega0, zeta);
        (local_frame as f64 / total_frames as f64) * settle
    } else {
        local_frame as f64 * fps.frame_duration_secs()
    };

    displacement(omega0, zeta, t).clamp(0.0, 1.0)
}

fn natural_settle_secs(omega0: f64, zeta: f64) -> f64 {
    let log_eps = (1.0 / SETTLE_EPSILON).ln();
    if zeta < 1.0 {
        // Envelope e^(-zeta*omega0*t) governs decay.
        log_eps / (zeta.max(1e-3) * omega0)
    } else {
        // Slowest exponent dominates.
        let slow = omega0 * (zeta - (zeta * zeta - 1.0).max(0.0).sqrt());
        log_eps / slow.max(1e-6)
    }
}

fn displacement(omega0: f64, zeta: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if zeta < 1.0 {
        let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
        let envelope = (-zeta * omega0 * t).exp();
        1.0 - envelope * ((omega_d * t).cos() + (zeta * omega0 / omega_d) * (omega_d * t).sin())
    } else if (zeta - 1.0).abs() < 1e-9 {
        1.0 - (1.0 + omega0 * t) * (-omega0 * t).exp()
    } else {
        let root = (zeta * zeta - 1.0).sqrt();
        let r1 = -omega0 * (zeta - root);
        let r2 = -omega0 * (zeta + root);
        let c1 = r2 / (r1 - r2);
        let c2 = -1.0 - c1;
        1.0 + c1 * (r1 * t).exp() + c2 * (r2 * t).exp()
    }
}
