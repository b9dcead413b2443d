use {
    super::{
        configs::{
            ActorUpdateGate,
            DDPGConfig,
        },
        FunctionApproximator,
        Network,
        RunMode,
    },
    crate::{
        components::{
            NoiseGenerator,
            ReplayBuffer,
            Transition,
        },
        errors::{
            CheckpointError,
            ConfigurationError,
        },
    },
    anyhow::{
        anyhow,
        Result,
    },
    rand::{
        rngs::StdRng,
        SeedableRng,
    },
    tracing::{
        info,
        warn,
    },
};

/// Blend `live` into `target` as `tau * live + (1 - tau) * target`.
pub fn polyak(
    live: &[Vec<f64>],
    target: &[Vec<f64>],
    tau: f64,
) -> Result<Vec<Vec<f64>>> {
    if live.len() != target.len() {
        return Err(anyhow!(
            "live and target networks have {} and {} parameter tensors",
            live.len(),
            target.len(),
        ));
    }
    live.iter()
        .zip(target.iter())
        .map(|(l, t)| {
            if l.len() != t.len() {
                return Err(anyhow!("parameter tensors of size {} and {} cannot be blended", l.len(), t.len()));
            }
            Ok(l.iter()
                .zip(t.iter())
                .map(|(l, t)| tau * l + (1.0 - tau) * t)
                .collect())
        })
        .collect()
}

/// Losses of a single training step.
///
/// `actor_loss` is `None` on steps where the actor (and thereby the target
/// networks) was not updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainStats {
    pub critic_loss: f64,
    pub actor_loss: Option<f64>,
}

#[allow(clippy::upper_case_acronyms)]
pub struct DDPG<F: FunctionApproximator> {
    approximator: F,
    noise: NoiseGenerator,
    replay_buffer: ReplayBuffer,
    config: DDPGConfig,
    episode_counter: usize,
    train_steps: usize,
    previous_state: Option<Vec<f64>>,
    rng: StdRng,
    pub run_mode: RunMode,
}

impl<F: FunctionApproximator> DDPG<F> {
    pub fn new(
        config: DDPGConfig,
        approximator: F,
    ) -> Result<Self, ConfigurationError> {
        config.check()?;
        if config.memory_size < 2 * config.batch_size {
            warn!(
                "memory size {} can never hold two batches of {}, training will be skipped",
                config.memory_size, config.batch_size,
            );
        }
        Ok(Self {
            approximator,
            noise: NoiseGenerator::new(
                config.noise_strategy,
                config.noise_decay,
                config.num_outputs,
                config.seed,
            ),
            replay_buffer: ReplayBuffer::new(config.memory_size),
            episode_counter: 0,
            train_steps: 0,
            previous_state: None,
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            run_mode: RunMode::Train,
            config,
        })
    }

    /// Build the agent together with a freshly initialized approximator.
    pub fn from_config(config: &DDPGConfig) -> Result<Self> {
        config.check()?;
        let approximator = F::from_config(config)?;
        Ok(Self::new(config.clone(), approximator)?)
    }

    pub fn config(&self) -> &DDPGConfig {
        &self.config
    }

    pub fn approximator(&self) -> &F {
        &self.approximator
    }

    pub fn approximator_mut(&mut self) -> &mut F {
        &mut self.approximator
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }

    pub fn noise(&self) -> &NoiseGenerator {
        &self.noise
    }

    pub fn episode_counter(&self) -> usize {
        self.episode_counter
    }

    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn previous_state(&self) -> Option<&[f64]> {
        self.previous_state.as_deref()
    }

    /// Select an action for `state` during episode `episode`.
    ///
    /// The deterministic action is clipped to `[-1, 1]`, perturbed with
    /// exploration noise and clipped again. Non-finite actor outputs become
    /// `0.0`. The noise is reset once each
    /// time `episode` advances past the last one seen.
    pub fn action(
        &mut self,
        state: &[f64],
        episode: usize,
    ) -> Result<Vec<f64>> {
        let mut action = self
            .approximator
            .predict_actor(&[state.to_vec()])?
            .pop()
            .ok_or_else(|| anyhow!("the actor returned no action"))?;

        if episode > self.episode_counter {
            self.episode_counter = episode;
            self.noise.reset(episode);
            info!(episode, sigma = self.noise.sigma(), "noise reset");
        }

        if action.iter().any(|a| !a.is_finite()) {
            warn!(?action, "the actor diverged, replacing non-finite actions with 0");
        }
        for a in action.iter_mut() {
            *a = if a.is_finite() { a.clamp(-1.0, 1.0) } else { 0.0 };
        }
        if let RunMode::Train = self.run_mode {
            self.noise.perturb(&mut action);
            for a in action.iter_mut() {
                *a = a.clamp(-1.0, 1.0);
            }
        }
        Ok(action)
    }

    /// Seed the previous state with the first observation of an episode.
    pub fn begin_episode(
        &mut self,
        state: &[f64],
    ) {
        self.previous_state = Some(state.to_vec());
    }

    /// Store the transition from the previous state, if there is one, and
    /// remember `next_state` as the new previous state.
    pub fn feed(
        &mut self,
        action: &[f64],
        reward: f64,
        next_state: &[f64],
    ) {
        if let Some(state) = self.previous_state.take() {
            info!(
                concat!(
                    "\nPushing to replay buffer:",
                    "\n{state:?}",
                    "\n{action:?}",
                    "\n{reward:?}",
                    "\n{next_state:?}",
                ),
                state = state,
                action = action,
                reward = reward,
                next_state = next_state,
            );
            self.replay_buffer.push(Transition {
                state,
                action: action.to_vec(),
                reward,
                next_state: next_state.to_vec(),
            });
        }
        self.previous_state = Some(next_state.to_vec());
    }

    /// Perform one training step on a random minibatch.
    ///
    /// The critic is always updated. The actor is only updated when the
    /// gating counter is even, and the target networks are blended towards
    /// the live networks in exactly those steps. Returns `None` without
    /// touching anything while the buffer holds fewer than two batches.
    pub fn train(&mut self) -> Result<Option<TrainStats>> {
        let batch = match self
            .replay_buffer
            .random_batch(self.config.batch_size, &mut self.rng)
        {
            Some(batch) => batch,
            None => return Ok(None),
        };

        let next_actions = self.approximator.predict_target_actor(&batch.next_states)?;
        let next_q = self
            .approximator
            .predict_target_critic(&batch.next_states, &next_actions)?;
        let targets: Vec<f64> = batch
            .rewards
            .iter()
            .zip(next_q.iter())
            .map(|(r, q)| r + self.config.gamma * q)
            .collect();

        let critic_loss = self
            .approximator
            .update_critic(&batch.states, &batch.actions, &targets)?;

        let counter = match self.config.actor_update {
            ActorUpdateGate::EvenEpisodes => self.episode_counter,
            ActorUpdateGate::EvenSteps => self.train_steps,
        };
        let actor_loss = if counter % 2 == 0 {
            let loss = self.approximator.update_actor(&batch.states)?;
            self.soft_update_target_networks()?;
            Some(loss)
        } else {
            None
        };
        self.train_steps += 1;

        info!(critic_loss, ?actor_loss, step = self.train_steps, "trained");
        Ok(Some(TrainStats {
            critic_loss,
            actor_loss,
        }))
    }

    fn track(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        for live in [Network::Actor, Network::Critic] {
            let Some(target) = live.target_of() else { continue };
            let blended = polyak(
                &self.approximator.parameters(live)?,
                &self.approximator.parameters(target)?,
                tau,
            )?;
            self.approximator.set_parameters(target, &blended)?;
        }
        Ok(())
    }

    /// Copy the live networks into the target networks.
    pub fn update_target_networks(&mut self) -> Result<()> {
        for live in [Network::Actor, Network::Critic] {
            let Some(target) = live.target_of() else { continue };
            let parameters = self.approximator.parameters(live)?;
            self.approximator.set_parameters(target, &parameters)?;
        }
        Ok(())
    }

    /// Blend the live networks into the target networks with rate `tau`.
    pub fn soft_update_target_networks(&mut self) -> Result<()> {
        self.track(self.config.tau)
    }

    /// Restore the live networks from `name` and copy them into the targets.
    pub fn load_weights(
        &mut self,
        name: &str,
    ) -> Result<(), CheckpointError> {
        self.approximator.load(name)?;
        self.update_target_networks()
            .map_err(|e| CheckpointError::Unreadable {
                path: name.into(),
                reason: e.to_string(),
            })
    }

    pub fn save_weights(
        &self,
        name: &str,
    ) -> Result<()> {
        self.approximator.save(name)
    }
}
