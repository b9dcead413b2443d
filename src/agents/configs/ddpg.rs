use {
    super::ActorUpdateGate,
    crate::{
        components::NoiseStrategy,
        errors::ConfigurationError,
    },
    serde::{
        Deserialize,
        Serialize,
    },
};


/// Hyperparameters of the [`DDPG`](crate::agents::DDPG) agent.
///
/// # Example
/// ```
/// use cartpole_ddpg::{
///     agents::DDPGConfig,
///     components::NoiseStrategy,
///     errors::ConfigurationError,
/// };
///
/// let config = DDPGConfig::cartpole();
/// assert_eq!(config.num_inputs, 4);
/// assert_eq!(config.num_outputs, 1);
/// assert_eq!(config.noise_strategy, NoiseStrategy::GaussianDecay);
/// assert!(config.check().is_ok());
///
/// let config = DDPGConfig { gamma: 1.0, ..DDPGConfig::cartpole() };
/// assert_eq!(config.check(), Err(ConfigurationError::GammaTooLarge(1.0)));
/// ```
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DDPGConfig {
    // The dimensions of the state and action vectors.
    pub num_inputs: usize,
    pub num_outputs: usize,
    // Seeds the noise, the minibatch sampling and (where supported) the networks.
    pub seed: u64,
    // The weight for updating the target networks.
    pub tau: f64,
    // The impact of the q value of the next state on the current state's q value.
    pub gamma: f64,
    // The training batch size for each training step.
    pub batch_size: usize,
    // The capacity of the replay buffer used for sampling training data.
    pub memory_size: usize,
    // The horizon (in episodes) over which the exploration noise shrinks.
    pub noise_decay: usize,
    pub noise_strategy: NoiseStrategy,
    // The hidden layer sizes of the Actor and Critic networks.
    pub actor_layers: Vec<usize>,
    pub critic_layers: Vec<usize>,
    // The learning rates for the Actor and Critic networks.
    pub actor_lr: f64,
    pub critic_lr: f64,
    // Which counter gates the actor and target network updates.
    pub actor_update: ActorUpdateGate,
}
impl DDPGConfig {
    pub fn cartpole() -> Self {
        Self {
            num_inputs: 4,
            num_outputs: 1,
            seed: 1,
            tau: 0.01,
            gamma: 0.97,
            batch_size: 256,
            memory_size: 65_536,
            noise_decay: 2000,
            noise_strategy: NoiseStrategy::GaussianDecay,
            actor_layers: vec![128, 32],
            critic_layers: vec![128, 32],
            actor_lr: 2e-4,
            critic_lr: 3e-4,
            actor_update: ActorUpdateGate::EvenEpisodes,
        }
    }

    pub fn check(&self) -> Result<(), ConfigurationError> {
        if self.num_inputs == 0 {
            return Err(ConfigurationError::NotPositive("num_inputs"));
        }
        if self.num_outputs == 0 {
            return Err(ConfigurationError::NotPositive("num_outputs"));
        }
        #[allow(clippy::neg_cmp_op_on_partial_ord)]
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(ConfigurationError::TauOutOfRange(self.tau));
        }
        #[allow(clippy::neg_cmp_op_on_partial_ord)]
        if !(self.gamma < 1.0) {
            return Err(ConfigurationError::GammaTooLarge(self.gamma));
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::NotPositive("batch_size"));
        }
        if self.memory_size == 0 {
            return Err(ConfigurationError::NotPositive("memory_size"));
        }
        if self.noise_decay == 0 {
            return Err(ConfigurationError::NotPositive("noise_decay"));
        }
        for (name, layers) in [
            ("actor_layers", &self.actor_layers),
            ("critic_layers", &self.critic_layers),
        ] {
            if layers.is_empty() {
                return Err(ConfigurationError::EmptyLayers(name));
            }
            if layers.contains(&0) {
                return Err(ConfigurationError::ZeroSizedLayer(name));
            }
        }
        for (name, lr) in [
            ("actor_lr", self.actor_lr),
            ("critic_lr", self.critic_lr),
        ] {
            #[allow(clippy::neg_cmp_op_on_partial_ord)]
            if !(lr > 0.0) {
                return Err(ConfigurationError::NotPositive(name));
            }
        }
        Ok(())
    }
}
