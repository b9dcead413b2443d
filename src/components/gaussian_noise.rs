use {
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    rand_distr::StandardNormal,
};

/// Independent Gaussian noise whose standard deviation shrinks linearly with
/// the number of completed episodes.
///
/// `sigma = initial_sigma * (1 - episode / decay_horizon)`, never below
/// [`GaussianNoise::MIN_SIGMA`].
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    mu: f64,
    initial_sigma: f64,
    sigma: f64,
    decay_horizon: f64,
    size_action: usize,
    episode: usize,
    rng: StdRng,
}
impl GaussianNoise {
    pub const MIN_SIGMA: f64 = 0.01;

    pub fn new(
        mu: f64,
        initial_sigma: f64,
        decay_horizon: f64,
        size_action: usize,
        seed: u64,
    ) -> Self {
        Self {
            mu,
            initial_sigma,
            sigma: initial_sigma,
            decay_horizon,
            size_action,
            episode: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Draw one noise value per action dimension, each clipped to `[-1, 1]`.
    pub fn sample(&mut self) -> Vec<f64> {
        (0..self.size_action)
            .map(|_| {
                let z: f64 = self.rng.sample(StandardNormal);
                (self.mu + self.sigma * z).clamp(-1.0, 1.0)
            })
            .collect()
    }

    /// Recompute sigma for the given episode index.
    pub fn reset(
        &mut self,
        episode: usize,
    ) {
        self.episode = episode;
        let sigma = self.initial_sigma * (1.0 - (episode as f64 / self.decay_horizon));
        self.sigma = sigma.max(Self::MIN_SIGMA);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_decays_linearly_then_floors() {
        let mut noise = GaussianNoise::new(0.0, 1.0, 100.0, 1, 0);
        assert_eq!(noise.sigma(), 1.0);

        noise.reset(25);
        assert!((noise.sigma() - 0.75).abs() < 1e-12);
        noise.reset(50);
        assert!((noise.sigma() - 0.5).abs() < 1e-12);

        for episode in [99, 100, 101, 1_000, 1_000_000, usize::MAX / 2] {
            noise.reset(episode);
            assert!(noise.sigma() >= GaussianNoise::MIN_SIGMA);
        }
        noise.reset(1_000);
        assert_eq!(noise.sigma(), GaussianNoise::MIN_SIGMA);
    }

    #[test]
    fn samples_are_clipped_per_dimension() {
        let mut noise = GaussianNoise::new(0.0, 50.0, 1e9, 3, 1);
        for _ in 0..500 {
            let sample = noise.sample();
            assert_eq!(sample.len(), 3);
            assert!(sample.iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn same_seed_same_noise() {
        let mut a = GaussianNoise::new(0.0, 1.0, 10.0, 2, 9);
        let mut b = GaussianNoise::new(0.0, 1.0, 10.0, 2, 9);
        for _ in 0..20 {
            assert_eq!(a.sample(), b.sample());
        }
    }
}
