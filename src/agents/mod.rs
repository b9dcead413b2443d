//! # Agents
//!
//! The [`DDPG`] agent combines exploration noise, a replay buffer and a
//! [`FunctionApproximator`] into the Deep Deterministic Policy Gradient
//! algorithm.
//!
//! The agent never looks inside the approximator. It only needs the
//! predictions of the live and target networks, one gradient step on each
//! live network, and read/write access to the flat parameters so that it
//! can blend the targets towards the live networks itself. Two
//! approximators are provided:
//!
//! * [`MlpApproximator`] - multilayer perceptrons trained with AdamW on
//!   candle.
//! * [`LinearApproximator`] - a linear critic and a `tanh`-squashed linear
//!   actor with hand-derived gradients, cheap and fully deterministic.

mod configs;
mod ddpg;
mod linear;
mod mlp;

pub use {
    configs::{
        ActorUpdateGate,
        DDPGConfig,
    },
    ddpg::{
        polyak,
        TrainStats,
        DDPG,
    },
    linear::LinearApproximator,
    mlp::MlpApproximator,
};

use {
    crate::errors::CheckpointError,
    anyhow::Result,
    std::fmt::Display,
};


/// The execution mode of an agent is either training or testing.
///
/// Testing agents act deterministically, without exploration noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Train,
    Test,
}

impl Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Train => write!(f, "Train"),
            RunMode::Test => write!(f, "Test"),
        }
    }
}

/// Addresses one of the four networks held by a [`FunctionApproximator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Actor,
    Critic,
    TargetActor,
    TargetCritic,
}
impl Network {
    pub fn target_of(self) -> Option<Network> {
        match self {
            Network::Actor => Some(Network::TargetActor),
            Network::Critic => Some(Network::TargetCritic),
            _ => None,
        }
    }
}

/// The actor and critic networks, together with their target copies.
///
/// States and actions are passed as batches of rows. The dimensions are
/// `num_inputs` for states and `num_outputs` for actions as given in the
/// [`DDPGConfig`].
///
/// Parameters are exposed as a list of flat vectors, one per weight tensor,
/// in an order that is identical for a live network and its target.
pub trait FunctionApproximator: Sized {
    fn from_config(config: &DDPGConfig) -> Result<Self>;

    fn predict_actor(
        &self,
        states: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>>;

    fn predict_target_actor(
        &self,
        states: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>>;

    fn predict_critic(
        &self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Result<Vec<f64>>;

    fn predict_target_critic(
        &self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Result<Vec<f64>>;

    /// One step minimizing the mean squared error between the critic and
    /// `targets`. Returns the loss before the step.
    fn update_critic(
        &mut self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<f64>;

    /// One step maximizing the mean critic value of the actor's actions.
    /// Returns the (negated) objective before the step.
    fn update_actor(
        &mut self,
        states: &[Vec<f64>],
    ) -> Result<f64>;

    fn parameters(
        &self,
        network: Network,
    ) -> Result<Vec<Vec<f64>>>;

    fn set_parameters(
        &mut self,
        network: Network,
        parameters: &[Vec<f64>],
    ) -> Result<()>;

    /// Persist the live actor and critic under `name`.
    fn save(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Restore the live actor and critic saved under `name`.
    fn load(
        &mut self,
        name: &str,
    ) -> Result<(), CheckpointError>;
}
