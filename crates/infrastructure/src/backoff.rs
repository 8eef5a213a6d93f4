//! Backoff interval functions
//!
//! A [`Backoff`] maps a 1-based attempt number to the wait before the next
//! attempt. Every shape is non-negative, saturates instead of overflowing for
//! very large attempt numbers, and capped shapes never exceed their cap.
//!
//! Shapes are (de)serialisable so that policies can be written in
//! configuration files:
//!
//! ```toml
//! [policies.checkout]
//! max_attempts = 4
//! backoff = { type = "random_exponential", base_ms = 200, multiplier = 2.0, randomization = 0.1, max_ms = 10000 }
//! ```
//!
//! # Jitter
//!
//! Randomised shapes are symmetric around the deterministic delay `c`: a
//! factor `j` yields a wait in `[c * (1 - j), c * (1 + j)]`, floored at zero
//! and, when the shape has a cap, clamped to it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::DomainError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Signature of a caller-supplied backoff function
pub type BackoffFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Caller-supplied backoff function
#[derive(Clone)]
pub struct CustomBackoff(Arc<BackoffFn>);

impl fmt::Debug for CustomBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomBackoff(..)")
    }
}

impl PartialEq for CustomBackoff {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Shape of the wait between attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Same wait before every retry
    Fixed {
        /// Wait, milliseconds
        delay_ms: u64,
    },
    /// `base * attempt`
    Linear {
        /// Wait after the first attempt, milliseconds
        base_ms: u64,
    },
    /// `base * attempt²`
    Quadratic {
        /// Wait after the first attempt, milliseconds
        base_ms: u64,
    },
    /// `base * multiplier^(attempt - 1)`
    Exponential {
        /// Wait after the first attempt, milliseconds
        base_ms: u64,
        /// Growth factor
        multiplier: f64,
    },
    /// Exponential, clamped to `max_ms`
    ExponentialCapped {
        /// Wait after the first attempt, milliseconds
        base_ms: u64,
        /// Growth factor
        multiplier: f64,
        /// Upper bound, milliseconds
        max_ms: u64,
    },
    /// Exponential with symmetric jitter and an optional cap
    ExponentialWithJitter {
        /// Wait after the first attempt, milliseconds
        base_ms: u64,
        /// Growth factor
        multiplier: f64,
        /// Jitter factor in `[0, 1]`
        jitter: f64,
        /// Upper bound, milliseconds
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_ms: Option<u64>,
    },
    /// Capped exponential with a randomisation factor
    RandomExponential {
        /// Wait after the first attempt, milliseconds
        base_ms: u64,
        /// Growth factor
        multiplier: f64,
        /// Randomisation factor in `[0, 1]`
        randomization: f64,
        /// Upper bound, milliseconds
        max_ms: u64,
    },
    /// 100ms, then 500ms twice, then `2s * (attempt - 2)`
    DatabaseFriendly,
    /// 500ms twice, 2s twice, 10s twice, then 30s
    BusinessFriendly,
    /// `5s * attempt`
    RateLimitFriendly,
    /// Caller-supplied function; cannot be written to configuration
    #[serde(skip)]
    Custom(CustomBackoff),
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(1), 2.0)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_millis_f64(ms: f64) -> Duration {
    // `as` saturates: NaN and negatives become 0, huge values u64::MAX
    Duration::from_millis(ms.max(0.0) as u64)
}

#[allow(clippy::cast_precision_loss)]
fn exponential_ms(base_ms: u64, multiplier: f64, attempt: u32) -> f64 {
    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    base_ms as f64 * multiplier.powi(exponent)
}

fn jittered(centre: f64, factor: f64) -> f64 {
    if factor <= 0.0 || centre <= 0.0 || !centre.is_finite() {
        return centre;
    }
    let u: f64 = rand::rng().random_range(-1.0..=1.0);
    (centre * factor.min(1.0).mul_add(u, 1.0)).max(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn capped(ms: f64, max_ms: u64) -> f64 {
    ms.min(max_ms as f64)
}

impl Backoff {
    /// Same wait before every retry
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed {
            delay_ms: millis(delay),
        }
    }

    /// Wait growing linearly with the attempt number
    pub fn linear(base: Duration) -> Self {
        Self::Linear {
            base_ms: millis(base),
        }
    }

    /// Wait growing with the square of the attempt number
    pub fn quadratic(base: Duration) -> Self {
        Self::Quadratic {
            base_ms: millis(base),
        }
    }

    /// Uncapped exponential growth
    pub fn exponential(base: Duration, multiplier: f64) -> Self {
        Self::Exponential {
            base_ms: millis(base),
            multiplier,
        }
    }

    /// Exponential growth clamped to `max`
    pub fn exponential_capped(base: Duration, multiplier: f64, max: Duration) -> Self {
        Self::ExponentialCapped {
            base_ms: millis(base),
            multiplier,
            max_ms: millis(max),
        }
    }

    /// Exponential growth with symmetric jitter, clamped to `max`
    pub fn exponential_with_jitter(
        base: Duration,
        multiplier: f64,
        jitter: f64,
        max: Duration,
    ) -> Self {
        Self::ExponentialWithJitter {
            base_ms: millis(base),
            multiplier,
            jitter,
            max_ms: Some(millis(max)),
        }
    }

    /// Capped exponential growth randomised by `randomization`
    pub fn random_exponential(
        base: Duration,
        multiplier: f64,
        randomization: f64,
        max: Duration,
    ) -> Self {
        Self::RandomExponential {
            base_ms: millis(base),
            multiplier,
            randomization,
            max_ms: millis(max),
        }
    }

    /// Short waits first, then a slowly growing one
    pub const fn database_friendly() -> Self {
        Self::DatabaseFriendly
    }

    /// Stepped waits suited to user-facing calls
    pub const fn business_friendly() -> Self {
        Self::BusinessFriendly
    }

    /// Long linear waits for rate limited endpoints
    pub const fn rate_limit_friendly() -> Self {
        Self::RateLimitFriendly
    }

    /// Wrap an arbitrary function of the attempt number
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self::Custom(CustomBackoff(Arc::new(f)))
    }

    /// Wait after attempt `attempt` (1-based; 0 is treated as 1)
    pub fn delay(&self, attempt: u32) -> Duration {
        let n = attempt.max(1);
        match self {
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::Linear { base_ms } => Duration::from_millis(base_ms.saturating_mul(u64::from(n))),
            Self::Quadratic { base_ms } => {
                let square = u64::from(n).saturating_mul(u64::from(n));
                Duration::from_millis(base_ms.saturating_mul(square))
            },
            Self::Exponential {
                base_ms,
                multiplier,
            } => from_millis_f64(exponential_ms(*base_ms, *multiplier, n)),
            Self::ExponentialCapped {
                base_ms,
                multiplier,
                max_ms,
            } => from_millis_f64(capped(exponential_ms(*base_ms, *multiplier, n), *max_ms)),
            Self::ExponentialWithJitter {
                base_ms,
                multiplier,
                jitter,
                max_ms,
            } => {
                let centre = exponential_ms(*base_ms, *multiplier, n);
                match max_ms {
                    Some(max_ms) => {
                        let centre = capped(centre, *max_ms);
                        from_millis_f64(capped(jittered(centre, *jitter), *max_ms))
                    },
                    None => from_millis_f64(jittered(centre, *jitter)),
                }
            },
            Self::RandomExponential {
                base_ms,
                multiplier,
                randomization,
                max_ms,
            } => {
                let centre = capped(exponential_ms(*base_ms, *multiplier, n), *max_ms);
                from_millis_f64(capped(jittered(centre, *randomization), *max_ms))
            },
            Self::DatabaseFriendly => match n {
                1 => Duration::from_millis(100),
                2 | 3 => Duration::from_millis(500),
                _ => Duration::from_millis(2_000u64.saturating_mul(u64::from(n - 2))),
            },
            Self::BusinessFriendly => match n {
                1 | 2 => Duration::from_millis(500),
                3 | 4 => Duration::from_secs(2),
                5 | 6 => Duration::from_secs(10),
                _ => Duration::from_secs(30),
            },
            Self::RateLimitFriendly => {
                Duration::from_millis(5_000u64.saturating_mul(u64::from(n)))
            },
            Self::Custom(CustomBackoff(f)) => f(n),
        }
    }

    /// Upper bound of the shape, when it has one
    pub const fn max_delay(&self) -> Option<Duration> {
        match self {
            Self::Fixed { delay_ms } => Some(Duration::from_millis(*delay_ms)),
            Self::ExponentialCapped { max_ms, .. } | Self::RandomExponential { max_ms, .. } => {
                Some(Duration::from_millis(*max_ms))
            },
            Self::ExponentialWithJitter { max_ms, .. } => match max_ms {
                Some(max_ms) => Some(Duration::from_millis(*max_ms)),
                None => None,
            },
            Self::BusinessFriendly => Some(Duration::from_secs(30)),
            _ => None,
        }
    }

    /// Whether two calls with the same attempt can return different waits
    pub fn is_randomized(&self) -> bool {
        match self {
            Self::ExponentialWithJitter { jitter, .. } => *jitter > 0.0,
            Self::RandomExponential { randomization, .. } => *randomization > 0.0,
            _ => false,
        }
    }

    /// Reject parameters no shape can work with
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |msg: String| Err(DomainError::InvalidConfiguration(msg));
        match self {
            Self::Exponential { multiplier, .. } | Self::ExponentialCapped { multiplier, .. }
                if !multiplier.is_finite() || *multiplier <= 0.0 =>
            {
                invalid(format!("backoff multiplier must be positive, got {multiplier}"))
            },
            Self::ExponentialWithJitter {
                multiplier, jitter, ..
            }
            | Self::RandomExponential {
                multiplier,
                randomization: jitter,
                ..
            } => {
                if !multiplier.is_finite() || *multiplier <= 0.0 {
                    invalid(format!("backoff multiplier must be positive, got {multiplier}"))
                } else if !(0.0..=1.0).contains(jitter) {
                    invalid(format!("backoff jitter must be within [0, 1], got {jitter}"))
                } else {
                    Ok(())
                }
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { delay_ms } => write!(f, "fixed({delay_ms}ms)"),
            Self::Linear { base_ms } => write!(f, "linear({base_ms}ms)"),
            Self::Quadratic { base_ms } => write!(f, "quadratic({base_ms}ms)"),
            Self::Exponential {
                base_ms,
                multiplier,
            } => write!(f, "exponential({base_ms}ms, x{multiplier})"),
            Self::ExponentialCapped {
                base_ms,
                multiplier,
                max_ms,
            } => write!(f, "exponential({base_ms}ms, x{multiplier}, max {max_ms}ms)"),
            Self::ExponentialWithJitter {
                base_ms,
                multiplier,
                jitter,
                max_ms,
            } => {
                write!(f, "exponential({base_ms}ms, x{multiplier}, ±{jitter}")?;
                if let Some(max_ms) = max_ms {
                    write!(f, ", max {max_ms}ms")?;
                }
                f.write_str(")")
            },
            Self::RandomExponential {
                base_ms,
                multiplier,
                randomization,
                max_ms,
            } => write!(
                f,
                "random-exponential({base_ms}ms, x{multiplier}, ±{randomization}, max {max_ms}ms)"
            ),
            Self::DatabaseFriendly => f.write_str("database-friendly"),
            Self::BusinessFriendly => f.write_str("business-friendly"),
            Self::RateLimitFriendly => f.write_str("rate-limit-friendly"),
            Self::Custom(_) => f.write_str("custom"),
        }
    }
}
