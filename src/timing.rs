use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Speed {
    /// Human-like cadence.
    #[default]
    Normal,
    /// Roughly twice as fast.
    Fast,
}

impl Speed {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Speed::Normal),
            2 => Some(Speed::Fast),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self { Speed::Normal => 1, Speed::Fast => 2 }
    }

    fn scale(self) -> f64 {
        match self { Speed::Normal => 1.0, Speed::Fast => 0.5 }
    }
}

/// Delay ranges in seconds. Click delay and travel scale with `Speed`;
/// rests do not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingProfile {
    pub click_delay: (f64, f64),
    pub travel: (f64, f64),
    pub micro_rest_chance: f64,
    pub micro_rest: (f64, f64),
    pub unit_rest: (f64, f64),
    pub start_delay: f64,
}

impl TimingProfile {
    pub const HUMAN: TimingProfile = TimingProfile {
        click_delay: (0.11, 0.18),
        travel: (0.02, 0.06),
        micro_rest_chance: 0.04,
        micro_rest: (0.40, 0.90),
        unit_rest: (0.30, 0.70),
        start_delay: 3.0,
    };

    /// No waiting at all; for dry runs and tests.
    pub const INSTANT: TimingProfile = TimingProfile {
        click_delay: (0.0, 0.0),
        travel: (0.0, 0.0),
        micro_rest_chance: 0.0,
        micro_rest: (0.0, 0.0),
        unit_rest: (0.0, 0.0),
        start_delay: 0.0,
    };
}

impl Default for TimingProfile {
    fn default() -> Self { Self::HUMAN }
}

/// Human-like cadence generator. Holds nothing but its profile and random source.
#[derive(Debug)]
pub struct TimingModel<R = StdRng> {
    profile: TimingProfile,
    rng: R,
}

impl TimingModel<StdRng> {
    pub fn new(profile: TimingProfile) -> Self { Self::with_rng(profile, StdRng::from_entropy()) }
}

impl<R: Rng> TimingModel<R> {
    pub fn with_rng(profile: TimingProfile, rng: R) -> Self { Self { profile, rng } }

    /// Wait before the next click: a peaked draw from the click-delay range,
    /// plus a micro-rest with a small independent chance.
    pub fn next_delay(&mut self, speed: Speed) -> Duration {
        let (lo, hi) = self.profile.click_delay;
        let k = speed.scale();
        // mean of two uniforms peaks at the midpoint
        let t = (self.rng.gen::<f64>() + self.rng.gen::<f64>()) / 2.0;
        let mut secs = lo * k + (hi - lo) * k * t;
        if self.profile.micro_rest_chance > 0.0 && self.rng.gen_bool(self.profile.micro_rest_chance.min(1.0)) {
            secs += self.uniform(self.profile.micro_rest);
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// How long the cursor takes to travel to the next cell.
    pub fn travel_time(&mut self, speed: Speed) -> Duration {
        let (lo, hi) = self.profile.travel;
        let k = speed.scale();
        Duration::from_secs_f64(self.uniform((lo * k, hi * k)))
    }

    /// Pause after finishing a whole row or column.
    pub fn unit_rest(&mut self) -> Duration { Duration::from_secs_f64(self.uniform(self.profile.unit_rest)) }

    pub fn start_delay(&self) -> Duration { Duration::from_secs_f64(self.profile.start_delay.max(0.0)) }

    fn uniform(&mut self, (lo, hi): (f64, f64)) -> f64 {
        if hi <= lo { return lo.max(0.0); }
        self.rng.gen_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(profile: TimingProfile) -> TimingModel<StdRng> {
        TimingModel::with_rng(profile, StdRng::seed_from_u64(3))
    }

    fn mean(model: &mut TimingModel<StdRng>, speed: Speed, n: u32) -> f64 {
        (0..n).map(|_| model.next_delay(speed).as_secs_f64()).sum::<f64>() / n as f64
    }

    #[test]
    fn test_fast_is_quicker_on_average() {
        let mut m = model(TimingProfile::HUMAN);
        let normal = mean(&mut m, Speed::Normal, 10_000);
        let fast = mean(&mut m, Speed::Fast, 10_000);
        assert!(fast < normal, "fast {fast} should be below normal {normal}");
    }

    #[test]
    fn test_delays_stay_in_range_without_rests() {
        let profile = TimingProfile { micro_rest_chance: 0.0, ..TimingProfile::HUMAN };
        let mut m = model(profile);
        for _ in 0..2_000 {
            let d = m.next_delay(Speed::Normal).as_secs_f64();
            assert!((0.11 - 1e-9..=0.18 + 1e-9).contains(&d), "{d}");
            let f = m.next_delay(Speed::Fast).as_secs_f64();
            assert!((0.055 - 1e-9..=0.09 + 1e-9).contains(&f), "{f}");
        }
    }

    #[test]
    fn test_delays_are_not_constant() {
        let mut m = model(TimingProfile::HUMAN);
        let first = m.next_delay(Speed::Normal);
        assert!((0..100).any(|_| m.next_delay(Speed::Normal) != first));
    }

    #[test]
    fn test_micro_rests_happen_occasionally() {
        let mut m = model(TimingProfile::HUMAN);
        let rests = (0..5_000).filter(|_| m.next_delay(Speed::Normal).as_secs_f64() > 0.4).count();
        // 4% of 5000 is 200
        assert!(rests > 100 && rests < 320, "{rests}");
    }

    #[test]
    fn test_forced_micro_rest_is_much_longer() {
        let profile = TimingProfile { micro_rest_chance: 1.0, ..TimingProfile::HUMAN };
        let mut m = model(profile);
        for _ in 0..100 {
            assert!(m.next_delay(Speed::Fast).as_secs_f64() >= 0.45);
        }
    }

    #[test]
    fn test_instant_profile_never_waits() {
        let mut m = model(TimingProfile::INSTANT);
        assert_eq!(m.next_delay(Speed::Normal), Duration::ZERO);
        assert_eq!(m.travel_time(Speed::Fast), Duration::ZERO);
        assert_eq!(m.unit_rest(), Duration::ZERO);
        assert_eq!(m.start_delay(), Duration::ZERO);
    }

    #[test]
    fn test_travel_and_rests_in_range() {
        let mut m = model(TimingProfile::HUMAN);
        for _ in 0..500 {
            let t = m.travel_time(Speed::Fast).as_secs_f64();
            assert!((0.01 - 1e-9..=0.03 + 1e-9).contains(&t));
            let r = m.unit_rest().as_secs_f64();
            assert!((0.3 - 1e-9..=0.7 + 1e-9).contains(&r));
        }
        assert_eq!(m.start_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_speed_codes() {
        assert_eq!(Speed::from_code(1), Some(Speed::Normal));
        assert_eq!(Speed::from_code(2), Some(Speed::Fast));
        assert_eq!(Speed::from_code(0), None);
    }
}
