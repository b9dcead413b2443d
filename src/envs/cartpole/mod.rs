mod cart_pole;
mod config;
mod reward;
mod state;

pub use cart_pole::CartPoleEnv;
pub use config::CartPoleConfig;
pub use reward::CartPoleReward;
pub use state::CartPoleState;
