//! # Components
//!
//! This module contains the components that are used to build an agent.
//!
//! ## Noise
//!
//! The noise components add exploration noise to the actions of an agent.
//! [`GaussianNoise`] draws independent Gaussian noise whose sigma decays with
//! the number of episodes, [`OuNoise`] implements the Ornstein-Uhlenbeck
//! process. An agent holds exactly one of them, wrapped in a
//! [`NoiseGenerator`] chosen through [`NoiseStrategy`].
//!
//! ## Replay Buffer
//!
//! The [`ReplayBuffer`] struct implements a fixed-capacity replay buffer with
//! uniform sampling without replacement, as used by [`crate::agents::DDPG`].

mod gaussian_noise;
mod noise;
mod ou_noise;
mod replay_buffer;

pub use gaussian_noise::GaussianNoise;
pub use noise::{
    NoiseGenerator,
    NoiseStrategy,
};
pub use ou_noise::OuNoise;
pub use replay_buffer::{
    Batch,
    ReplayBuffer,
    Transition,
};
