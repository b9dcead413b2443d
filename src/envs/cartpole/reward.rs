use {
    super::state::CartPoleState,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::{
        Display,
        EnumIter,
    },
};

/// The reward function of the [`CartPoleEnv`](super::CartPoleEnv).
///
/// Both variants give exactly `-1.0` on termination and otherwise blend an
/// "upright" and a "centred" term with equal weights of 0.5.
///
/// * `Shaped` - upright is `1 - |θ| / angle_bound`
/// * `Cosine` - upright is `cos(|θ|)`
///
/// In both cases centred is `1 - |x| / position_bound`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum CartPoleReward {
    #[default]
    Shaped,
    Cosine,
}
impl CartPoleReward {
    pub fn compute(
        &self,
        state: &CartPoleState,
        terminated: bool,
        position_bound: f64,
        angle_bound: f64,
    ) -> f64 {
        if terminated {
            return -1.0;
        }
        let upright = match self {
            CartPoleReward::Shaped => 1.0 - state.angle.abs() / angle_bound,
            CartPoleReward::Cosine => state.angle.abs().to_radians().cos(),
        };
        let centred = 1.0 - state.position.abs() / position_bound;
        (0.5 * upright) + (0.5 * centred)
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        strum::IntoEnumIterator,
    };

    #[test]
    fn terminated_states_are_punished_with_minus_one() {
        let state = CartPoleState::new(0.0, 0.0, 0.0, 0.0);
        for reward in CartPoleReward::iter() {
            assert_eq!(reward.compute(&state, true, 3.0, 12.0), -1.0);
        }
    }

    #[test]
    fn shaped_reward_weights_upright_and_centred_equally() {
        let reward = CartPoleReward::Shaped;
        assert_eq!(reward.compute(&CartPoleState::default(), false, 3.0, 12.0), 1.0);

        let state = CartPoleState::new(1.5, 0.0, 6.0, 0.0);
        assert!((reward.compute(&state, false, 3.0, 12.0) - 0.5).abs() < 1e-12);

        let state = CartPoleState::new(-3.0, 0.0, 0.0, 0.0);
        assert!((reward.compute(&state, false, 3.0, 12.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn shaped_reward_is_unbounded_below_outside_the_bounds() {
        let state = CartPoleState::new(30.0, 0.0, 120.0, 0.0);
        assert_eq!(CartPoleReward::Shaped.compute(&state, false, 3.0, 12.0), -9.0);
    }

    #[test]
    fn non_terminated_rewards_never_exceed_one() {
        for reward in CartPoleReward::iter() {
            for x in [-4.0, -3.0, -0.1, 0.0, 0.7, 3.0, 10.0] {
                for theta in [-30.0, -12.0, -0.5, 0.0, 5.0, 12.0, 90.0] {
                    let state = CartPoleState::new(x, 1.0, theta, -2.0);
                    assert!(reward.compute(&state, false, 3.0, 12.0) <= 1.0);
                }
            }
        }
    }
}
