mod ddpg;

pub use ddpg::DDPGConfig;

use {
    serde::{
        Deserialize,
        Serialize,
    },
    strum::Display,
};


/// Which counter decides whether a training step also updates the actor and
/// the target networks. Only steps where the counter is even do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ActorUpdateGate {
    /// The number of episodes the agent has seen.
    #[default]
    EvenEpisodes,
    /// The number of training steps the agent has performed.
    EvenSteps,
}
