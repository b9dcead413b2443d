use {
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    rand_distr::StandardNormal,
};

/// The Ornstein-Uhlenbeck process, which produces temporally correlated
/// noise that reverts to `mu`.
///
/// Each evolution applies `state += theta * (mu - state) + sigma * N(0, 1)`.
/// Sigma decays linearly from `max_sigma` to `min_sigma` over
/// `decay_period` units of the training-time index.
#[derive(Debug, Clone)]
pub struct OuNoise {
    mu: f64,
    theta: f64,
    sigma: f64,
    max_sigma: f64,
    min_sigma: f64,
    decay_period: f64,
    low: f64,
    high: f64,
    time: usize,
    state: Vec<f64>,
    rng: StdRng,
}
impl OuNoise {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mu: f64,
        theta: f64,
        max_sigma: f64,
        min_sigma: f64,
        decay_period: f64,
        (low, high): (f64, f64),
        size_action: usize,
        seed: u64,
    ) -> Self {
        let mut noise = Self {
            mu,
            theta,
            sigma: max_sigma,
            max_sigma,
            min_sigma,
            decay_period,
            low,
            high,
            time: 0,
            state: vec![mu; size_action],
            rng: StdRng::seed_from_u64(seed),
        };
        noise.redraw();
        noise
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn time(&self) -> usize {
        self.time
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }

    fn normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    fn redraw(&mut self) {
        for i in 0..self.state.len() {
            self.state[i] = self.mu + self.sigma * self.normal();
        }
    }

    fn decayed_sigma(&self) -> f64 {
        let progress = (self.time as f64 / self.decay_period).min(1.0);
        self.max_sigma - (self.max_sigma - self.min_sigma) * progress
    }

    /// Advance the process by one step and return the new state.
    pub fn evolve(&mut self) -> &[f64] {
        for i in 0..self.state.len() {
            let x = self.state[i];
            let dx = self.theta * (self.mu - x) + self.sigma * self.normal();
            self.state[i] = x + dx;
        }
        self.sigma = self.decayed_sigma();
        &self.state
    }

    /// Advance the process and return it clipped to `[-1, 1]`.
    pub fn sample(&mut self) -> Vec<f64> {
        self.evolve()
            .iter()
            .map(|v| v.clamp(-1.0, 1.0))
            .collect()
    }

    /// Perturb `action` in place, clipping the result to the process bounds.
    pub fn get_action(
        &mut self,
        action: &mut [f64],
        time: usize,
    ) {
        self.time = time;
        self.evolve();
        for (a, x) in action.iter_mut().zip(self.state.iter()) {
            *a = (*a + x).clamp(self.low, self.high);
        }
    }

    /// Move the training-time index to `time` and restart the process.
    pub fn reset(
        &mut self,
        time: usize,
    ) {
        self.time = time;
        self.sigma = self.decayed_sigma();
        self.redraw();
    }
}
