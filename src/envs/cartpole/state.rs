use {
    super::super::VectorConvertible,
    serde::{
        Deserialize,
        Serialize,
    },
    std::fmt::Display,
};

/// The state type for the [`CartPoleEnv`](super::CartPoleEnv) environment.
///
/// Angles are given in degrees, the angular velocity in degrees per second.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartPoleState {
    pub position: f64,
    pub velocity: f64,
    pub angle: f64,
    pub angular_velocity: f64,
}
impl CartPoleState {
    pub fn new(
        position: f64,
        velocity: f64,
        angle: f64,
        angular_velocity: f64,
    ) -> Self {
        Self {
            position,
            velocity,
            angle,
            angular_velocity,
        }
    }

    /// The number of dimensions of the state vector.
    pub const SIZE: usize = 4;

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.angular_velocity.is_finite()
    }
}

impl Display for CartPoleState {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "S(x: {:.3}, v: {:.3}, θ: {:.3}, ω: {:.3})",
            self.position, self.velocity, self.angle, self.angular_velocity,
        )
    }
}

impl VectorConvertible for CartPoleState {
    /// Missing trailing components default to 0.0.
    fn from_vec(value: Vec<f64>) -> Self {
        let get = |i: usize| value.get(i).copied().unwrap_or(0.0);
        Self::new(get(0), get(1), get(2), get(3))
    }

    fn to_vec(value: Self) -> Vec<f64> {
        vec![
            value.position,
            value.velocity,
            value.angle,
            value.angular_velocity,
        ]
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_layout_is_position_velocity_angle_angular_velocity() {
        let state = CartPoleState::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(CartPoleState::to_vec(state), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(CartPoleState::from_vec(vec![1.0, 2.0, 3.0, 4.0]), state);
    }

    #[test]
    fn short_vectors_are_padded_with_zeros() {
        let state = CartPoleState::from_vec(vec![0.5]);
        assert_eq!(state, CartPoleState::new(0.5, 0.0, 0.0, 0.0));
    }
}
