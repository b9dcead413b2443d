use {
    crate::{
        agents::{
            DDPGConfig,
            FunctionApproximator,
            LinearApproximator,
            MlpApproximator,
        },
        components::NoiseStrategy,
        engine::{
            save_run,
            TrainConfig,
            TrainingSession,
        },
        envs::CartPoleConfig,
        logging::setup_logging,
        render::TraceSink,
    },
    anyhow::Result,
    clap::{
        Parser,
        ValueEnum,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs::read_to_string,
        path::PathBuf,
    },
    tracing::{
        warn,
        Level,
    },
};


#[derive(ValueEnum, Debug, Clone)]
pub enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // all the little details
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::None => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Setup logging
    #[arg(long, value_enum, default_value_t=Loglevel::None)]
    pub log: Loglevel,

    /// A ron file holding the environment, algorithm and training configs.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of episodes per repetition.
    #[arg(long)]
    pub episodes: Option<usize>,

    /// Number of independent repetitions.
    #[arg(long)]
    pub repetitions: Option<usize>,

    /// The exploration noise.
    #[arg(long, value_enum)]
    pub noise: Option<NoiseStrategy>,

    /// Fill the replay buffer up to this size before training.
    #[arg(long)]
    pub prefill: Option<usize>,

    /// Base seed of the first repetition.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Weights to load at the start of every repetition.
    #[arg(long)]
    pub checkpoint: Option<String>,

    /// Save the final weights to the checkpoint.
    #[arg(long)]
    pub save_weights: bool,

    /// Use linear function approximators instead of neural networks.
    #[arg(long)]
    pub linear: bool,

    /// Log every frame as it would be drawn.
    #[arg(long)]
    pub trace: bool,

    /// Directory under `data/` to write the results to.
    #[arg(long)]
    pub output: Option<String>,
}


/// The full set of configs of one experiment, as stored in a `--config` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub env: CartPoleConfig,
    pub ddpg: DDPGConfig,
    pub train: TrainConfig,
}
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            env: CartPoleConfig::default(),
            ddpg: DDPGConfig::cartpole(),
            train: TrainConfig::cartpole(),
        }
    }
}
impl ExperimentConfig {
    /// Start from the config file if one is given and apply the command-line
    /// overrides on top.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => ron::from_str(&read_to_string(path)?)?,
            None => Self::default(),
        };

        if let Some(episodes) = args.episodes {
            config.train.episodes = episodes;
        }
        if let Some(repetitions) = args.repetitions {
            config.train.repetitions = repetitions;
        }
        if let Some(noise) = args.noise {
            config.ddpg.noise_strategy = noise;
        }
        if let Some(seed) = args.seed {
            config.ddpg.seed = seed;
        }
        if args.prefill.is_some() {
            config.train.prefill = args.prefill;
        }
        if args.checkpoint.is_some() {
            config.train.checkpoint = args.checkpoint.clone();
        }
        config.train.save_weights |= args.save_weights;
        Ok(config)
    }
}


/// Set up logging, then train with the approximator chosen on the command
/// line and write the results if an output directory was given.
pub fn run(args: Args) -> Result<()> {
    // per-step details only go to the file
    let level = args.log.level();
    setup_logging(&"debug.log", level, level.map(|l| l.min(Level::WARN)))?;

    let config = ExperimentConfig::from_args(&args)?;
    if args.linear {
        train::<LinearApproximator>(config, &args)
    } else {
        train::<MlpApproximator>(config, &args)
    }
}

fn train<F: FunctionApproximator>(
    config: ExperimentConfig,
    args: &Args,
) -> Result<()> {
    let ExperimentConfig { env, ddpg, train } = config;

    let mut session = TrainingSession::<F>::new(env.clone(), ddpg.clone(), train.clone())?;
    if args.trace {
        session = session.with_sink(Box::<TraceSink>::default());
    }
    let records = session.run()?;

    let steps: usize = records.iter().map(|r| r.steps).sum();
    warn!("Finished {} episodes in {steps} steps", records.len());

    if let Some(output) = &args.output {
        save_run(output, &env, &ddpg, &train, records)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("cartpole_ddpg").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_are_the_cartpole_presets() {
        let config = ExperimentConfig::from_args(&parse(&[])).unwrap();
        assert_eq!(config, ExperimentConfig::default());
    }

    #[test]
    fn flags_override_the_presets() {
        let config = ExperimentConfig::from_args(&parse(&[
            "--episodes", "10",
            "--repetitions", "3",
            "--noise", "ornstein-uhlenbeck",
            "--prefill", "512",
            "--seed", "7",
            "--checkpoint", "weights",
            "--save-weights",
        ]))
        .unwrap();
        assert_eq!(config.train.episodes, 10);
        assert_eq!(config.train.repetitions, 3);
        assert_eq!(config.train.prefill, Some(512));
        assert_eq!(config.train.checkpoint.as_deref(), Some("weights"));
        assert!(config.train.save_weights);
        assert_eq!(config.ddpg.noise_strategy, NoiseStrategy::OrnsteinUhlenbeck);
        assert_eq!(config.ddpg.seed, 7);
    }

    #[test]
    fn config_file_round_trips() {
        let path = std::env::temp_dir().join("cartpole_ddpg_cli_config.ron");
        let mut expected = ExperimentConfig::default();
        expected.train.episodes = 5;
        std::fs::write(&path, ron::to_string(&expected).unwrap()).unwrap();

        let config = ExperimentConfig::from_args(&parse(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(config, expected);
    }
}
