//! Retry policy types and configuration.

use std::time::Duration;

/// Number of retries used by [`RetryPolicy::default`].
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry used by [`RetryPolicy::default`].
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Growth factor used by [`RetryPolicy::exponential`].
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// A retry policy describing how to retry failed loads.
///
/// Policies are pure data - they describe retry behavior but don't execute it.
/// This makes them easy to test, clone, and inspect.
///
/// Every policy is bounded: `max_retries` is the number of attempts made
/// *after* the initial one, so a policy never produces more than
/// `max_retries + 1` attempts in total.
///
/// # Examples
///
/// ```rust
/// use loadwell::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential(Duration::from_millis(100))
///     .with_max_retries(5);
///
/// assert_eq!(policy.max_retries(), 5);
///
/// // Constant delay with a max delay cap
/// let policy = RetryPolicy::constant(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(30));
/// assert_eq!(policy.max_delay(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    strategy: RetryStrategy,
    max_retries: u32,
    max_delay: Option<Duration>,
    jitter: JitterStrategy,
}

/// The backoff strategy for retry delays.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Fixed delay between attempts.
    Constant(Duration),
    /// Delay increases linearly: base * (attempt + 1).
    Linear {
        /// Base delay duration.
        base: Duration,
    },
    /// Delay grows geometrically: initial * multiplier^attempt.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Growth factor applied per retry. Must be finite and `>= 1.0`.
        multiplier: f64,
    },
}

/// Strategy for adding randomness to delays.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JitterStrategy {
    /// No jitter applied.
    #[default]
    None,
    /// Add ±percentage randomness to delay.
    Proportional(f64),
    /// Random delay between 0 and calculated delay.
    Full,
    /// Random delay between base and 3x the previous delay.
    Decorrelated,
}

/// Information about a failed attempt, passed to retry hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before next attempt, `None` when this was the last one.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since first attempt.
    pub elapsed: Duration,
}

impl Default for RetryPolicy {
    /// Three retries, starting at one second and doubling.
    fn default() -> Self {
        Self::exponential(DEFAULT_INITIAL_DELAY)
    }
}

impl RetryPolicy {
    fn with_strategy(strategy: RetryStrategy) -> Self {
        Self {
            strategy,
            max_retries: DEFAULT_MAX_RETRIES,
            max_delay: None,
            jitter: JitterStrategy::None,
        }
    }

    /// Create a policy that never retries.
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    ///
    /// let policy = RetryPolicy::none();
    /// assert_eq!(policy.delay_for_attempt(0), None);
    /// ```
    pub fn none() -> Self {
        Self::constant(Duration::ZERO).with_max_retries(0)
    }

    /// Create a policy with constant delay between retries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::constant(Duration::from_millis(500))
    ///     .with_max_retries(3);
    ///
    /// // Every retry waits 500ms
    /// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(500)));
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(500)));
    /// assert_eq!(policy.delay_for_attempt(3), None); // max_retries exceeded
    /// ```
    pub fn constant(delay: Duration) -> Self {
        Self::with_strategy(RetryStrategy::Constant(delay))
    }

    /// Create a policy with linearly increasing delay.
    ///
    /// Delay = base * (attempt + 1)
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::linear(Duration::from_millis(100));
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
    /// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(200)));
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(300)));
    /// ```
    pub fn linear(base: Duration) -> Self {
        Self::with_strategy(RetryStrategy::Linear { base })
    }

    /// Create a policy whose delay doubles after every failed attempt.
    ///
    /// Delay = initial * 2^attempt. Use [`with_backoff_multiplier`] to pick
    /// another growth factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(100))
    ///     .with_max_retries(5);
    ///
    /// // Delay doubles: 100ms, 200ms, 400ms, 800ms, 1600ms
    /// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
    /// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(200)));
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
    /// ```
    ///
    /// [`with_backoff_multiplier`]: RetryPolicy::with_backoff_multiplier
    pub fn exponential(initial: Duration) -> Self {
        Self::with_strategy(RetryStrategy::Exponential {
            initial,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        })
    }

    /// Set the maximum number of retry attempts.
    ///
    /// This does not include the initial attempt. For example, `with_max_retries(3)`
    /// means up to 4 total attempts (1 initial + 3 retries), and
    /// `with_max_retries(0)` means a single attempt with no waiting.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the growth factor between consecutive delays.
    ///
    /// A constant or linear policy becomes exponential, keeping its first
    /// delay as the starting point. Delays never shrink: a multiplier below
    /// `1.0`, or NaN, is raised to `1.0`.
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(50))
    ///     .with_backoff_multiplier(3.0);
    ///
    /// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(150)));
    /// ```
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        let initial = match self.strategy {
            RetryStrategy::Constant(d) => d,
            RetryStrategy::Linear { base } => base,
            RetryStrategy::Exponential { initial, .. } => initial,
        };
        self.strategy = RetryStrategy::Exponential {
            initial,
            multiplier: growth_factor(multiplier),
        };
        self
    }

    /// Set the maximum delay cap.
    ///
    /// Delays will never exceed this value, regardless of the backoff strategy.
    pub fn with_max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    /// Add proportional jitter to delays.
    ///
    /// The factor determines the range of randomness. For example, `0.25` means
    /// the actual delay will be ±25% of the calculated delay.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, this method does nothing.
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter = JitterStrategy::Proportional(factor.clamp(0.0, 1.0));
        self
    }

    /// Use full jitter: a random delay between 0 and the calculated delay.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, this method does nothing.
    pub fn with_full_jitter(mut self) -> Self {
        self.jitter = JitterStrategy::Full;
        self
    }

    /// Use decorrelated jitter: a random delay between the calculated delay
    /// and 3x the previous one.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, this method does nothing.
    pub fn with_decorrelated_jitter(mut self) -> Self {
        self.jitter = JitterStrategy::Decorrelated;
        self
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the maximum delay cap.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Get the jitter strategy.
    pub fn jitter(&self) -> &JitterStrategy {
        &self.jitter
    }

    /// Get the retry strategy.
    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    /// Calculate the delay before retry N (0-indexed), without jitter.
    ///
    /// Returns None if no more retries should be attempted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(100))
    ///     .with_max_retries(3);
    ///
    /// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
    /// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(200)));
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
    /// assert_eq!(policy.delay_for_attempt(3), None); // exceeded max_retries
    /// ```
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let base_delay = match &self.strategy {
            RetryStrategy::Constant(d) => *d,
            RetryStrategy::Linear { base } => base.saturating_mul(attempt.saturating_add(1)),
            RetryStrategy::Exponential {
                initial,
                multiplier,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                scale(*initial, growth_factor(*multiplier).powi(exponent))
            }
        };

        let capped = match self.max_delay {
            Some(max) => base_delay.min(max),
            None => base_delay,
        };

        Some(capped)
    }

    /// Calculate the delay with jitter applied.
    ///
    /// This is used internally by the retry loop.
    #[doc(hidden)]
    pub fn delay_with_jitter(
        &self,
        attempt: u32,
        prev_delay: Option<Duration>,
    ) -> Option<Duration> {
        let base_delay = self.delay_for_attempt(attempt)?;
        Some(self.jitter.apply(base_delay, prev_delay, self.max_delay))
    }

    /// The deterministic delay schedule, one entry per retry.
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(10))
    ///     .with_max_retries(2);
    ///
    /// let delays: Vec<_> = policy.delays().collect();
    /// assert_eq!(delays, vec![Duration::from_millis(10), Duration::from_millis(20)]);
    /// ```
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).filter_map(move |attempt| self.delay_for_attempt(attempt))
    }

    /// Sum of every backoff delay in the schedule, ignoring jitter.
    pub fn total_delay(&self) -> Duration {
        self.delays()
            .fold(Duration::ZERO, |total, d| total.saturating_add(d))
    }

    /// Upper bound on the time a retried load may take when every attempt
    /// is limited to `timeout`.
    ///
    /// Equal to `(max_retries + 1) * timeout + total_delay()`.
    ///
    /// ```rust
    /// use loadwell::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(50))
    ///     .with_max_retries(2);
    ///
    /// assert_eq!(
    ///     policy.worst_case_latency(Duration::from_millis(100)),
    ///     Duration::from_millis(450)
    /// );
    /// ```
    pub fn worst_case_latency(&self, timeout: Duration) -> Duration {
        timeout
            .saturating_mul(self.max_retries.saturating_add(1))
            .saturating_add(self.total_delay())
    }

    /// Check that the backoff multiplier is usable.
    ///
    /// Exponential policies need a finite multiplier of at least `1.0`, so
    /// delays never shrink between attempts.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self.strategy {
            RetryStrategy::Exponential { multiplier, .. }
                if !multiplier.is_finite() || multiplier < 1.0 =>
            {
                Err("backoff multiplier must be a finite number >= 1.0")
            }
            _ => Ok(()),
        }
    }
}

impl JitterStrategy {
    /// Apply jitter to a base delay.
    ///
    /// # Arguments
    ///
    /// * `base_delay` - The calculated delay before jitter
    /// * `prev_delay` - The previous delay (for decorrelated jitter)
    /// * `max_delay` - Optional cap on the final delay
    pub fn apply(
        &self,
        base_delay: Duration,
        #[cfg_attr(not(feature = "jitter"), allow(unused_variables))] prev_delay: Option<Duration>,
        max_delay: Option<Duration>,
    ) -> Duration {
        let jittered = match self {
            JitterStrategy::None => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Proportional(factor) => {
                use rand::Rng;
                let base_millis = base_delay.as_millis() as f64;
                let jitter_range = base_millis * factor;
                let min = (base_millis - jitter_range).max(0.0);
                let max = base_millis + jitter_range;
                let jittered_millis = rand::rng().random_range(min..=max);
                Duration::from_millis(jittered_millis as u64)
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Proportional(_) => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Full => {
                use rand::Rng;
                let max_millis = base_delay.as_millis() as u64;
                if max_millis == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::rng().random_range(0..=max_millis))
                }
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Full => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Decorrelated => {
                use rand::Rng;
                let prev = prev_delay.unwrap_or(base_delay);
                let base_millis = base_delay.as_millis() as u64;
                let max_millis = prev.as_millis().saturating_mul(3) as u64;
                if max_millis <= base_millis {
                    base_delay
                } else {
                    Duration::from_millis(rand::rng().random_range(base_millis..=max_millis))
                }
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Decorrelated => base_delay,
        };

        match max_delay {
            Some(max) => jittered.min(max),
            None => jittered,
        }
    }
}

/// Multiply a duration by a float factor, rounding to the nearest nanosecond
/// and saturating at `Duration::MAX`.
// Lowest usable backoff multiplier is 1.0; NaN counts as 1.0.
fn growth_factor(multiplier: f64) -> f64 {
    if multiplier.is_nan() {
        1.0
    } else {
        multiplier.max(1.0)
    }
}

fn scale(base: Duration, factor: f64) -> Duration {
    let nanos = (base.as_nanos() as f64 * factor).round();
    if nanos.is_nan() || nanos <= 0.0 {
        Duration::ZERO
    } else if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos as u64)
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for_attempt(3), None);
    }

    #[test]
    fn test_constant_delay() {
        let policy = RetryPolicy::constant(Duration::from_millis(100)).with_max_retries(3);

        assert_eq!(
            policy.delay_for_attempt(0),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            policy.delay_for_attempt(2),
            Some(Duration::from_millis(100))
        );
        assert_eq!(policy.delay_for_attempt(3), None);
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::linear(Duration::from_millis(100)).with_max_retries(5);

        assert_eq!(
            policy.delay_for_attempt(0),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            policy.delay_for_attempt(3),
            Some(Duration::from_millis(400))
        );
    }

    #[test]
    fn test_fractional_multiplier() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100))
            .with_backoff_multiplier(1.5)
            .with_max_retries(3);

        assert_eq!(
            policy.delay_for_attempt(0),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            policy.delay_for_attempt(1),
            Some(Duration::from_millis(150))
        );
        assert_eq!(
            policy.delay_for_attempt(2),
            Some(Duration::from_millis(225))
        );
    }

    #[test]
    fn test_multiplier_of_one_is_constant() {
        let policy = RetryPolicy::exponential(Duration::from_millis(40))
            .with_backoff_multiplier(1.0)
            .with_max_retries(4);

        assert!(policy.delays().all(|d| d == Duration::from_millis(40)));
    }

    #[test]
    fn test_multiplier_converts_constant_strategy() {
        let policy = RetryPolicy::constant(Duration::from_millis(10)).with_backoff_multiplier(2.0);

        assert_eq!(
            policy.strategy(),
            &RetryStrategy::Exponential {
                initial: Duration::from_millis(10),
                multiplier: 2.0
            }
        );
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100))
            .with_max_retries(10)
            .with_max_delay(Duration::from_millis(500));

        assert_eq!(
            policy.delay_for_attempt(2),
            Some(Duration::from_millis(400))
        );
        assert_eq!(
            policy.delay_for_attempt(3),
            Some(Duration::from_millis(500))
        ); // capped
        assert_eq!(
            policy.delay_for_attempt(9),
            Some(Duration::from_millis(500))
        ); // capped
    }

    #[test]
    fn test_huge_exponent_saturates() {
        let policy = RetryPolicy::exponential(Duration::from_secs(1)).with_max_retries(u32::MAX);

        assert_eq!(policy.delay_for_attempt(5_000), Some(Duration::MAX));
    }

    #[test]
    fn test_zero_retries_has_empty_schedule() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100)).with_max_retries(0);

        assert_eq!(policy.delay_for_attempt(0), None);
        assert_eq!(policy.delays().count(), 0);
        assert_eq!(policy.total_delay(), Duration::ZERO);
    }

    #[test]
    fn test_total_delay_and_worst_case() {
        let policy = RetryPolicy::exponential(Duration::from_millis(50)).with_max_retries(2);

        assert_eq!(policy.total_delay(), Duration::from_millis(150));
        assert_eq!(
            policy.worst_case_latency(Duration::from_millis(100)),
            Duration::from_millis(450)
        );
    }

    #[test]
    fn test_validate_rejects_shrinking_multiplier() {
        let shrinking = |multiplier| {
            RetryPolicy::with_strategy(RetryStrategy::Exponential {
                initial: Duration::from_millis(10),
                multiplier,
            })
        };

        assert!(shrinking(0.5).validate().is_err());
        assert!(shrinking(f64::NAN).validate().is_err());
        assert!(shrinking(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_shrinking_multiplier_is_raised_to_one() {
        for multiplier in [0.5, 0.0, -2.0, f64::NAN] {
            let policy = RetryPolicy::exponential(Duration::from_millis(50))
                .with_backoff_multiplier(multiplier)
                .with_max_retries(3);

            assert!(policy.validate().is_ok());
            assert!(policy.delays().all(|d| d == Duration::from_millis(50)));
        }
    }

    #[test]
    fn test_invalid_strategy_never_shrinks_delays() {
        let policy = RetryPolicy::with_strategy(RetryStrategy::Exponential {
            initial: Duration::from_millis(50),
            multiplier: 0.5,
        })
        .with_max_retries(2);

        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![Duration::from_millis(50), Duration::from_millis(50)]
        );
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy::none().validate().is_ok());
        assert!(RetryPolicy::linear(Duration::from_millis(1))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_jitter_strategy_default() {
        assert_eq!(JitterStrategy::default(), JitterStrategy::None);
    }

    #[test]
    fn test_jitter_none_returns_base_delay() {
        let base = Duration::from_millis(100);
        assert_eq!(JitterStrategy::None.apply(base, None, None), base);
    }

    #[test]
    fn test_jitter_respects_max_delay() {
        let base = Duration::from_millis(100);
        let capped = JitterStrategy::Proportional(1.0).apply(
            base,
            None,
            Some(Duration::from_millis(50)),
        );
        assert!(capped <= Duration::from_millis(50));
    }

    #[test]
    fn test_policy_getters() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100))
            .with_max_retries(3)
            .with_max_delay(Duration::from_secs(5))
            .with_jitter(0.25);

        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.max_delay(), Some(Duration::from_secs(5)));
        assert!(matches!(policy.jitter(), JitterStrategy::Proportional(_)));
        assert!(matches!(
            policy.strategy(),
            RetryStrategy::Exponential { .. }
        ));
    }

    #[test]
    fn test_jitter_factor_is_clamped() {
        let policy = RetryPolicy::default().with_jitter(4.0);
        assert_eq!(policy.jitter(), &JitterStrategy::Proportional(1.0));
    }
}
