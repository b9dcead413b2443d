//! # Environments
//!
//! The only environment shipped here is the [`CartPoleEnv`], an inverted
//! pendulum balanced on a cart that is pushed left or right along a track.
//!
//! Agents are library agnostic and work on flat `f64` vectors, so
//! observations convert to and from `Vec<f64>` through [`VectorConvertible`].

pub mod cartpole;

pub use crate::envs::cartpole::{
    CartPoleConfig,
    CartPoleEnv,
    CartPoleReward,
    CartPoleState,
};

pub trait VectorConvertible {
    fn from_vec(value: Vec<f64>) -> Self;
    fn to_vec(value: Self) -> Vec<f64>;
}
