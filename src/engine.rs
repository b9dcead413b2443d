use {
    crate::{
        agents::{
            DDPGConfig,
            FunctionApproximator,
            DDPG,
        },
        envs::{
            CartPoleConfig,
            CartPoleEnv,
            CartPoleState,
            VectorConvertible,
        },
        errors::{
            CheckpointError,
            ConfigurationError,
        },
        render::{
            FrameSink,
            NullSink,
        },
    },
    anyhow::{
        anyhow,
        Result,
    },
    polars::prelude::{
        DataFrame,
        NamedFrom,
        ParquetWriter,
        Series,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs::{
            create_dir_all,
            File,
        },
        io::Write,
        path::Path,
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
    },
    tracing::{
        info,
        warn,
    },
};


/// Options of the outer training loop.
///
/// # Fields
/// * `episodes` - The number of episodes per repetition.
/// * `repetitions` - The number of independent runs, each with a fresh agent.
/// * `prefill` - Fill the replay buffer up to this size before training.
/// * `checkpoint` - Weights to load at the start of every repetition.
/// * `save_weights` - Save the final weights back to `checkpoint`.
///
/// # Example
/// ```
/// use cartpole_ddpg::engine::TrainConfig;
///
/// let config = TrainConfig::cartpole();
/// assert_eq!(config.episodes, 2000);
/// assert_eq!(config.repetitions, 1);
/// assert_eq!(config.prefill, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub episodes: usize,
    pub repetitions: usize,
    pub prefill: Option<usize>,
    pub checkpoint: Option<String>,
    pub save_weights: bool,
}
impl TrainConfig {
    pub fn new(
        episodes: usize,
        repetitions: usize,
    ) -> Self {
        Self {
            episodes,
            repetitions,
            prefill: None,
            checkpoint: None,
            save_weights: false,
        }
    }

    pub fn cartpole() -> Self {
        Self::new(2000, 1)
    }

    pub fn check(&self) -> Result<(), ConfigurationError> {
        if self.episodes == 0 {
            return Err(ConfigurationError::NotPositive("episodes"));
        }
        if self.repetitions == 0 {
            return Err(ConfigurationError::NotPositive("repetitions"));
        }
        Ok(())
    }
}

/// Running sums over the steps of the current episode.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EpisodeMetrics {
    pub reward: f64,
    pub position: f64,
    pub angle: f64,
    pub steps: usize,
}
impl EpisodeMetrics {
    pub fn record(
        &mut self,
        reward: f64,
        state: &CartPoleState,
    ) {
        self.reward += reward;
        self.position += state.position;
        self.angle += state.angle;
        self.steps += 1;
    }

    pub fn finish(
        &self,
        repetition: usize,
        episode: usize,
    ) -> EpisodeRecord {
        let steps = self.steps.max(1) as f64;
        EpisodeRecord {
            repetition,
            episode,
            steps: self.steps,
            total_reward: self.reward,
            mean_reward: self.reward / steps,
            mean_position: self.position / steps,
            mean_angle: self.angle / steps,
        }
    }
}

/// The aggregates of one completed episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub repetition: usize,
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    pub mean_reward: f64,
    pub mean_position: f64,
    pub mean_angle: f64,
}


/// Everything one training run needs: the environment, the agent and the
/// collected metrics.
///
/// Stepping is strictly sequential. Each step selects an action, integrates
/// the physics, feeds the transition back and trains once before the next
/// step begins. A run can be stopped cooperatively through
/// [`stop_handle`](TrainingSession::stop_handle), which is checked between
/// steps.
pub struct TrainingSession<F: FunctionApproximator> {
    env: CartPoleEnv,
    agent: DDPG<F>,
    ddpg_config: DDPGConfig,
    train_config: TrainConfig,
    sink: Box<dyn FrameSink>,
    stop: Arc<AtomicBool>,
    records: Vec<EpisodeRecord>,
}

impl<F: FunctionApproximator> TrainingSession<F> {
    pub fn new(
        env_config: CartPoleConfig,
        ddpg_config: DDPGConfig,
        train_config: TrainConfig,
    ) -> Result<Self> {
        train_config.check()?;
        ddpg_config.check()?;
        if ddpg_config.num_inputs != CartPoleState::SIZE {
            Err(ConfigurationError::DimensionMismatch {
                option: "num_inputs",
                expected: CartPoleState::SIZE,
                got: ddpg_config.num_inputs,
            })?
        }
        if ddpg_config.num_outputs != 1 {
            Err(ConfigurationError::DimensionMismatch {
                option: "num_outputs",
                expected: 1,
                got: ddpg_config.num_outputs,
            })?
        }
        if let Some(target) = train_config.prefill {
            if target > ddpg_config.memory_size {
                Err(ConfigurationError::PrefillTooLarge {
                    target,
                    capacity: ddpg_config.memory_size,
                })?
            }
        }

        let env = CartPoleEnv::new(env_config)?;
        let agent = Self::fresh_agent(&ddpg_config, 0)?;
        Ok(Self {
            env,
            agent,
            ddpg_config,
            train_config,
            sink: Box::new(NullSink),
            stop: Arc::new(AtomicBool::new(false)),
            records: Vec::new(),
        })
    }

    pub fn with_sink(
        mut self,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        self.sink = sink;
        self
    }

    /// Each repetition gets its own seed so that repetitions are independent.
    fn fresh_agent(
        config: &DDPGConfig,
        repetition: usize,
    ) -> Result<DDPG<F>> {
        let config = DDPGConfig {
            seed: config.seed.wrapping_add(repetition as u64),
            ..config.clone()
        };
        DDPG::from_config(&config)
    }

    pub fn env(&self) -> &CartPoleEnv {
        &self.env
    }

    pub fn agent(&self) -> &DDPG<F> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DDPG<F> {
        &mut self.agent
    }

    pub fn sink(&self) -> &dyn FrameSink {
        self.sink.as_ref()
    }

    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run every repetition and return the records of all completed episodes.
    pub fn run(&mut self) -> Result<&[EpisodeRecord]> {
        for repetition in 0..self.train_config.repetitions {
            self.start_repetition(repetition)?;
            if let Some(target) = self.train_config.prefill {
                if !self.prefill(target)? {
                    break;
                }
            }
            if !self.run_repetition(repetition)? {
                break;
            }
        }

        if self.train_config.save_weights {
            if let Some(name) = &self.train_config.checkpoint {
                self.agent.save_weights(name)?;
                warn!("Weights saved to {name}");
            }
        }
        Ok(&self.records)
    }

    /// Prepare the agent for `repetition`.
    ///
    /// Every repetition after the first starts over with a fresh agent: new
    /// networks, an empty replay buffer and undecayed noise. Configured
    /// weights are loaded if they exist.
    pub fn start_repetition(
        &mut self,
        repetition: usize,
    ) -> Result<()> {
        if repetition > 0 {
            warn!("Repetition {repetition}");
            self.agent = Self::fresh_agent(&self.ddpg_config, repetition)?;
        }

        if let Some(name) = &self.train_config.checkpoint {
            match self.agent.load_weights(name) {
                Ok(()) => warn!("Weights loaded from {name}"),
                Err(CheckpointError::NotFound(path)) => {
                    warn!("No weights at {}, starting from scratch", path.display())
                }
                Err(e) => return Err(anyhow!(e)),
            }
        }
        Ok(())
    }

    /// One environment step driven by the agent. Returns the new state and
    /// whether the episode terminated.
    fn step(
        &mut self,
        state: CartPoleState,
        episode: usize,
        step: usize,
        train: bool,
    ) -> Result<(CartPoleState, f64, bool)> {
        let action = self.agent.action(&CartPoleState::to_vec(state), episode)?;
        self.env.apply_action(action[0]);
        let (next_state, terminated) = self.env.tick(self.env.config().dt, step);
        let reward = self.env.reward(&next_state, terminated);

        self.agent.feed(&action, reward, &CartPoleState::to_vec(next_state));
        if train {
            self.agent.train()?;
        }
        self.sink.frame(&next_state, self.env.applied_action());
        Ok((next_state, reward, terminated))
    }

    fn reset_env(&mut self) -> CartPoleState {
        self.env.reset();
        let state = self.env.state();
        self.agent.begin_episode(&CartPoleState::to_vec(state));
        state
    }

    /// Step without training until the replay buffer holds `target`
    /// transitions.
    ///
    /// Actions are selected exactly as during training, at episode 0 so the
    /// noise does not decay. Returns `false` if the run was stopped.
    pub fn prefill(
        &mut self,
        target: usize,
    ) -> Result<bool> {
        warn!("Filling memory up to {target}");
        let mut state = self.reset_env();
        let mut step = 0;

        while self.agent.replay_buffer().len() < target {
            if self.stopped() {
                warn!("Stopped while filling memory");
                return Ok(false);
            }
            let (next_state, _, terminated) = self.step(state, 0, step, false)?;
            state = next_state;
            step += 1;
            if terminated {
                state = self.reset_env();
                step = 0;
            }
        }

        self.reset_env();
        warn!("Memory filled: {}", self.agent.replay_buffer().len());
        Ok(true)
    }

    /// Train for the configured number of episodes.
    ///
    /// Returns `false` if the run was stopped before all episodes completed.
    pub fn run_repetition(
        &mut self,
        repetition: usize,
    ) -> Result<bool> {
        let mut state = self.reset_env();
        let mut metrics = EpisodeMetrics::default();
        let mut episode = 0;
        let mut step = 0;

        while episode < self.train_config.episodes {
            if self.stopped() {
                warn!("Stopped in repetition {repetition} at episode {episode}");
                return Ok(false);
            }

            let (next_state, reward, terminated) = self.step(state, episode, step, true)?;
            metrics.record(reward, &next_state);
            state = next_state;
            step += 1;

            if terminated {
                let record = metrics.finish(repetition, episode);
                warn!(
                    "episode {episode} with total reward of {:.3} after {} steps",
                    record.total_reward, record.steps,
                );
                info!(
                    recording = self.sink.is_recording(),
                    playing = self.sink.is_playing(),
                    sigma = self.agent.noise().sigma(),
                    buffer = self.agent.replay_buffer().len(),
                );
                self.records.push(record);

                metrics = EpisodeMetrics::default();
                episode += 1;
                step = 0;
                state = self.reset_env();
            }
        }
        Ok(true)
    }
}


/// Persist the configs and the episode records of a run under `data/<path>`.
///
/// Each repetition gets its own `run_{n}_data.parquet`. Refuses to write into
/// a directory that already holds a run.
pub fn save_run(
    path: &dyn AsRef<Path>,
    env_config: &CartPoleConfig,
    ddpg_config: &DDPGConfig,
    train_config: &TrainConfig,
    records: &[EpisodeRecord],
) -> Result<()> {
    let path = Path::new("data/").join(path);

    if path.join("config_algorithm.ron").try_exists()? {
        Err(anyhow!(concat!(
            "Algorithm config already exists in this directory!\n",
            "I am assuming I would be overwriting existing data!",
        )))?
    }

    create_dir_all(path.as_path())?;

    let pretty = ron::ser::PrettyConfig::default;
    File::create(path.join("config_algorithm.ron"))?
        .write_all(ron::ser::to_string_pretty(ddpg_config, pretty())?.as_bytes())?;
    File::create(path.join("config_environment.ron"))?
        .write_all(ron::ser::to_string_pretty(env_config, pretty())?.as_bytes())?;
    File::create(path.join("config_train.ron"))?
        .write_all(ron::ser::to_string_pretty(train_config, pretty())?.as_bytes())?;

    for n in 0..train_config.repetitions {
        let run: Vec<&EpisodeRecord> = records.iter().filter(|r| r.repetition == n).collect();
        if run.is_empty() {
            continue;
        }
        let column = |f: fn(&EpisodeRecord) -> f64| run.iter().map(|r| f(r)).collect::<Vec<f64>>();

        let mut df = DataFrame::new(vec![
            Series::new("episode", &run.iter().map(|r| r.episode as u64).collect::<Vec<u64>>()),
            Series::new("steps", &run.iter().map(|r| r.steps as u64).collect::<Vec<u64>>()),
            Series::new("total_reward", &column(|r| r.total_reward)),
            Series::new("mean_reward", &column(|r| r.mean_reward)),
            Series::new("mean_position", &column(|r| r.mean_position)),
            Series::new("mean_angle", &column(|r| r.mean_angle)),
        ])?;

        ParquetWriter::new(File::create(path.join(format!("run_{n}_data.parquet")))?)
            .finish(&mut df)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            agents::{
                LinearApproximator,
                Network,
                RunMode,
            },
            render::TraceSink,
        },
    };

    fn configs() -> (CartPoleConfig, DDPGConfig, TrainConfig) {
        let env = CartPoleConfig::new(3.0, 12.0, 50);
        let ddpg = DDPGConfig {
            batch_size: 8,
            memory_size: 256,
            noise_decay: 20,
            actor_lr: 1e-4,
            critic_lr: 1e-4,
            ..DDPGConfig::cartpole()
        };
        (env, ddpg, TrainConfig::new(3, 2))
    }

    fn session() -> TrainingSession<LinearApproximator> {
        let (env, ddpg, train) = configs();
        TrainingSession::new(env, ddpg, train).unwrap()
    }

    #[test]
    fn every_repetition_records_every_episode() {
        let mut session = session();
        let records = session.run().unwrap();
        assert_eq!(records.len(), 6);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.repetition, i / 3);
            assert_eq!(record.episode, i % 3);
            assert!(record.steps >= 1);
            assert!(record.steps <= 50 + 2);
        }
    }

    #[test]
    fn a_balanced_episode_lasts_until_the_step_after_max_steps() {
        let (env, ddpg, train) = configs();
        // two batches never fit in memory, so the actor stays at rest
        let ddpg = DDPGConfig { batch_size: 200, ..ddpg };
        let mut session = TrainingSession::<LinearApproximator>::new(env, ddpg, train).unwrap();
        session.start_repetition(0).unwrap();
        session.agent_mut().run_mode = RunMode::Test;
        session
            .agent_mut()
            .approximator_mut()
            .set_parameters(Network::Actor, &[vec![0.0; 4], vec![0.0]])
            .unwrap();

        session.run_repetition(0).unwrap();
        assert_eq!(session.records().len(), 3);
        for record in session.records() {
            // step indices 0 through 51, the last one exceeds max_steps
            assert_eq!(record.steps, 52);
            assert_eq!(record.total_reward, 50.0);
            assert_eq!(record.mean_position, 0.0);
        }
        assert_eq!(session.agent().train_steps(), 0);
    }

    #[test]
    fn one_transition_is_stored_per_step() {
        let mut session = session();
        session.run().unwrap();
        let last_repetition: usize = session
            .records()
            .iter()
            .filter(|r| r.repetition == 1)
            .map(|r| r.steps)
            .sum();
        assert_eq!(session.agent().replay_buffer().len(), last_repetition);
        assert!(session.agent().train_steps() > 0);
    }

    #[test]
    fn a_new_repetition_starts_from_scratch() {
        let mut session = session();
        session.start_repetition(0).unwrap();
        session.run_repetition(0).unwrap();
        assert!(!session.agent().replay_buffer().is_empty());
        assert_eq!(session.agent().episode_counter(), 2);

        session.start_repetition(1).unwrap();
        assert!(session.agent().replay_buffer().is_empty());
        assert_eq!(session.agent().episode_counter(), 0);
        assert_eq!(session.agent().train_steps(), 0);
        assert_eq!(session.agent().noise().sigma(), 1.0);
        assert_eq!(session.agent().config().seed, 2);
    }

    #[test]
    fn prefill_fills_without_training() {
        let mut session = session();
        session.start_repetition(0).unwrap();
        assert!(session.prefill(100).unwrap());
        assert_eq!(session.agent().replay_buffer().len(), 100);
        assert_eq!(session.agent().train_steps(), 0);
        assert_eq!(session.agent().episode_counter(), 0);
    }

    #[test]
    fn stopping_ends_the_run_early() {
        let mut session = session();
        session.stop_handle().store(true, Ordering::Relaxed);
        assert!(session.run().unwrap().is_empty());
        assert!(session.agent().replay_buffer().is_empty());
    }

    #[test]
    fn sink_sees_every_step() {
        let (env, ddpg, _) = configs();
        let mut session = TrainingSession::<LinearApproximator>::new(env, ddpg, TrainConfig::new(2, 1))
            .unwrap()
            .with_sink(Box::<TraceSink>::default());
        session.run().unwrap();
        assert!(session.env().reset_count() >= 2);
        assert!(!session.sink().is_recording());
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let (env, ddpg, train) = configs();
        let ddpg = DDPGConfig { num_inputs: 3, ..ddpg };
        let err = TrainingSession::<LinearApproximator>::new(env, ddpg, train)
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::DimensionMismatch {
                option: "num_inputs",
                expected: 4,
                got: 3,
            }),
        );
    }

    #[test]
    fn prefill_must_fit_in_memory() {
        let (env, ddpg, mut train) = configs();
        train.prefill = Some(1000);
        let err = TrainingSession::<LinearApproximator>::new(env, ddpg, train)
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::PrefillTooLarge {
                target: 1000,
                capacity: 256,
            }),
        );
    }

    #[test]
    fn missing_checkpoint_is_not_fatal() {
        let (env, ddpg, mut train) = configs();
        train.checkpoint = Some("cartpole_ddpg_no_such_checkpoint".to_string());
        let mut session = TrainingSession::<LinearApproximator>::new(env, ddpg, train).unwrap();
        assert!(session.start_repetition(0).is_ok());
    }

    #[test]
    fn metrics_average_over_the_episode() {
        let mut metrics = EpisodeMetrics::default();
        metrics.record(1.0, &CartPoleState::new(1.0, 0.0, 2.0, 0.0));
        metrics.record(0.0, &CartPoleState::new(-3.0, 0.0, 4.0, 0.0));
        let record = metrics.finish(1, 7);
        assert_eq!(record.repetition, 1);
        assert_eq!(record.episode, 7);
        assert_eq!(record.steps, 2);
        assert_eq!(record.total_reward, 1.0);
        assert_eq!(record.mean_reward, 0.5);
        assert_eq!(record.mean_position, -1.0);
        assert_eq!(record.mean_angle, 3.0);
    }

    #[test]
    fn empty_metrics_do_not_divide_by_zero() {
        let record = EpisodeMetrics::default().finish(0, 0);
        assert_eq!(record.mean_reward, 0.0);
    }

    #[test]
    fn train_config_rejects_empty_budgets() {
        assert_eq!(
            TrainConfig::new(0, 1).check(),
            Err(ConfigurationError::NotPositive("episodes")),
        );
        assert_eq!(
            TrainConfig::new(1, 0).check(),
            Err(ConfigurationError::NotPositive("repetitions")),
        );
    }
}
