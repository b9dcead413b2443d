use {
    super::{
        GaussianNoise,
        OuNoise,
    },
    clap::ValueEnum,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::{
        Display,
        EnumIter,
    },
};

/// Selects which exploration noise an agent is built with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter, ValueEnum)]
pub enum NoiseStrategy {
    #[default]
    GaussianDecay,
    OrnsteinUhlenbeck,
}

/// Exploration noise, fixed to one strategy for the lifetime of an agent.
#[derive(Debug, Clone)]
pub enum NoiseGenerator {
    GaussianDecay(GaussianNoise),
    OrnsteinUhlenbeck(OuNoise),
}
impl NoiseGenerator {
    /// Build the generator for `strategy`.
    ///
    /// `noise_decay` is the horizon over which exploration shrinks. The
    /// Gaussian variant reaches its floor after three quarters of it, the
    /// Ornstein-Uhlenbeck variant after all of it.
    pub fn new(
        strategy: NoiseStrategy,
        noise_decay: usize,
        size_action: usize,
        seed: u64,
    ) -> Self {
        match strategy {
            NoiseStrategy::GaussianDecay => Self::GaussianDecay(GaussianNoise::new(
                0.0,
                1.0,
                (3 * noise_decay) as f64 / 4.0,
                size_action,
                seed,
            )),
            NoiseStrategy::OrnsteinUhlenbeck => Self::OrnsteinUhlenbeck(OuNoise::new(
                0.0,
                0.1,
                0.35,
                0.05,
                noise_decay as f64,
                (-0.5, 0.5),
                size_action,
                seed,
            )),
        }
    }

    pub fn strategy(&self) -> NoiseStrategy {
        match self {
            Self::GaussianDecay(_) => NoiseStrategy::GaussianDecay,
            Self::OrnsteinUhlenbeck(_) => NoiseStrategy::OrnsteinUhlenbeck,
        }
    }

    pub fn sigma(&self) -> f64 {
        match self {
            Self::GaussianDecay(noise) => noise.sigma(),
            Self::OrnsteinUhlenbeck(noise) => noise.sigma(),
        }
    }

    /// Noise for each action dimension, clipped to `[-1, 1]`.
    pub fn sample(&mut self) -> Vec<f64> {
        match self {
            Self::GaussianDecay(noise) => noise.sample(),
            Self::OrnsteinUhlenbeck(noise) => noise.sample(),
        }
    }

    /// Add exploration noise to an already clipped deterministic action.
    ///
    /// The result may leave `[-1, 1]` for the Gaussian variant, callers clip
    /// afterwards.
    pub fn perturb(
        &mut self,
        action: &mut [f64],
    ) {
        match self {
            Self::GaussianDecay(noise) => {
                for (a, n) in action.iter_mut().zip(noise.sample()) {
                    *a += n;
                }
            }
            Self::OrnsteinUhlenbeck(noise) => {
                let time = noise.time();
                noise.get_action(action, time);
            }
        }
    }

    /// Called once per completed episode.
    pub fn reset(
        &mut self,
        episode: usize,
    ) {
        match self {
            Self::GaussianDecay(noise) => noise.reset(episode),
            Self::OrnsteinUhlenbeck(noise) => noise.reset(episode),
        }
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        strum::IntoEnumIterator,
    };

    #[test]
    fn generator_keeps_its_strategy() {
        for strategy in NoiseStrategy::iter() {
            let mut noise = NoiseGenerator::new(strategy, 100, 1, 0);
            noise.reset(10);
            noise.sample();
            assert_eq!(noise.strategy(), strategy);
        }
    }

    #[test]
    fn gaussian_horizon_is_three_quarters_of_the_decay() {
        let mut noise = NoiseGenerator::new(NoiseStrategy::GaussianDecay, 100, 1, 0);
        assert_eq!(noise.sigma(), 1.0);
        noise.reset(75);
        assert_eq!(noise.sigma(), GaussianNoise::MIN_SIGMA);
    }

    #[test]
    fn perturbation_matches_action_dimensions() {
        for strategy in NoiseStrategy::iter() {
            let mut noise = NoiseGenerator::new(strategy, 100, 3, 5);
            let mut action = vec![0.1, -0.2, 0.3];
            noise.perturb(&mut action);
            assert_eq!(action.len(), 3);
            assert!(action.iter().all(|a| a.is_finite()));
        }
    }
}
