use {
    super::reward::CartPoleReward,
    crate::errors::ConfigurationError,
    serde::{
        Deserialize,
        Serialize,
    },
};

/// The configuration struct for the [`CartPoleEnv`](super::CartPoleEnv) environment.
///
/// # Fields
/// * `cart_mass` - The mass of the cart.
/// * `pole_mass` - The mass of the pole.
/// * `pole_length` - The length of the pole.
/// * `position_bound` - The episode terminates once `|x|` exceeds this.
/// * `angle_bound` - The episode terminates once `|θ|` exceeds this (degrees).
/// * `damping` - Linear damping on the cart velocity.
/// * `angle_damping` - Linear damping on the angular velocity.
/// * `max_steps` - The episode terminates once the step index exceeds this.
/// * `gravity` - Gravitational acceleration.
/// * `force_scale` - Force applied for a normalized action of 1.0.
/// * `dt` - The integration timestep in seconds.
/// * `reward` - The reward function. See [`CartPoleReward`].
///
/// # Example
/// ```
/// use cartpole_ddpg::envs::{
///     CartPoleConfig,
///     CartPoleReward,
/// };
///
/// let config = CartPoleConfig::default();
/// assert_eq!(config.cart_mass, 10.0);
/// assert_eq!(config.pole_mass, 1.0);
/// assert_eq!(config.pole_length, 1.0);
/// assert_eq!(config.position_bound, 3.0);
/// assert_eq!(config.angle_bound, 12.0);
/// assert_eq!(config.max_steps, 500);
/// assert_eq!(config.gravity, 9.81);
/// assert_eq!(config.reward, CartPoleReward::Shaped);
/// assert!(config.check().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleConfig {
    pub cart_mass: f64,
    pub pole_mass: f64,
    pub pole_length: f64,
    pub position_bound: f64,
    pub angle_bound: f64,
    pub damping: f64,
    pub angle_damping: f64,
    pub max_steps: usize,
    pub gravity: f64,
    pub force_scale: f64,
    pub dt: f64,
    pub reward: CartPoleReward,
}
impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            cart_mass: 10.0,
            pole_mass: 1.0,
            pole_length: 1.0,
            position_bound: 3.0,
            angle_bound: 12.0,
            damping: 0.0,
            angle_damping: 0.0,
            max_steps: 500,
            gravity: 9.81,
            force_scale: 100.0,
            dt: 0.02,
            reward: CartPoleReward::Shaped,
        }
    }
}
impl CartPoleConfig {
    /// Creates a new [CartPoleConfig] with the given bounds and default physics.
    pub fn new(
        position_bound: f64,
        angle_bound: f64,
        max_steps: usize,
    ) -> Self {
        Self {
            position_bound,
            angle_bound,
            max_steps,
            ..Default::default()
        }
    }

    pub fn check(&self) -> Result<(), ConfigurationError> {
        let positive = [
            ("cart_mass", self.cart_mass),
            ("pole_mass", self.pole_mass),
            ("pole_length", self.pole_length),
            ("position_bound", self.position_bound),
            ("angle_bound", self.angle_bound),
            ("dt", self.dt),
        ];
        for (name, value) in positive {
            #[allow(clippy::neg_cmp_op_on_partial_ord)]
            if !(value > 0.0) {
                return Err(ConfigurationError::NotPositive(name));
            }
        }
        if self.max_steps == 0 {
            return Err(ConfigurationError::NotPositive("max_steps"));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_constants_are_rejected() {
        let config = CartPoleConfig {
            pole_length: 0.0,
            ..Default::default()
        };
        assert_eq!(config.check(), Err(ConfigurationError::NotPositive("pole_length")));

        let config = CartPoleConfig {
            dt: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.check(), Err(ConfigurationError::NotPositive("dt")));

        let config = CartPoleConfig::new(3.0, 12.0, 0);
        assert_eq!(config.check(), Err(ConfigurationError::NotPositive("max_steps")));
    }

    #[test]
    fn config_survives_ron() {
        let config = CartPoleConfig::new(2.4, 15.0, 200);
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let back: CartPoleConfig = ron::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
