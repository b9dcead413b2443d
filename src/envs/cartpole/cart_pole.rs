use {
    super::{
        config::CartPoleConfig,
        state::CartPoleState,
    },
    crate::errors::ConfigurationError,
    tracing::info,
};

/// Advance `state` by one explicit Euler step under `force`.
///
/// The cart acceleration follows the closed-form inverted-pendulum-on-cart
/// equations. The angular acceleration is then derived from the cart
/// acceleration through the pendulum kinematics. Velocities are updated
/// before positions, both with the same `dt`.
fn integrate(
    config: &CartPoleConfig,
    state: CartPoleState,
    force: f64,
    dt: f64,
) -> CartPoleState {
    let CartPoleConfig {
        cart_mass,
        pole_mass,
        pole_length,
        gravity,
        damping,
        angle_damping,
        ..
    } = *config;

    let rad = state.angle.to_radians();
    let (sin, cos) = rad.sin_cos();
    let angular_velocity_rad = state.angular_velocity.to_radians();

    // cart
    let centripetal = pole_mass * pole_length * angular_velocity_rad.powi(2) * sin;
    let gravitational = pole_mass * gravity * sin * cos;
    let denominator = cart_mass + pole_mass - pole_mass * cos * cos;
    let acceleration = (force - centripetal + gravitational) / denominator - damping * state.velocity;
    let velocity = state.velocity + acceleration * dt;
    let position = state.position + velocity * dt;

    // pole
    let a = acceleration / pole_length * cos;
    let b = gravity / pole_length * sin;
    let angular_acceleration = (a + b).to_degrees() - angle_damping * state.angular_velocity;
    let angular_velocity = state.angular_velocity + angular_acceleration * dt;
    let angle = state.angle + angular_velocity * dt;

    CartPoleState {
        position,
        velocity,
        angle,
        angular_velocity,
    }
}


/// An inverted pendulum balanced on a cart.
///
/// The environment is the sole owner of the cart-pole state. Besides the raw
/// [`step`](CartPoleEnv::step) it keeps a cumulative applied action in
/// `[-1, 1]` which [`tick`](CartPoleEnv::tick) converts into a force, and
/// which renderers draw as the push on the cart.
#[derive(Debug, Clone)]
pub struct CartPoleEnv {
    config: CartPoleConfig,
    state: CartPoleState,
    applied_action: f64,
    terminated: bool,
    reset_count: usize,
}
impl CartPoleEnv {
    pub fn new(config: CartPoleConfig) -> Result<Self, ConfigurationError> {
        config.check()?;
        Ok(Self {
            config,
            state: CartPoleState::default(),
            applied_action: 0.0,
            terminated: false,
            reset_count: 0,
        })
    }

    pub fn config(&self) -> &CartPoleConfig {
        &self.config
    }

    /// Put the cart back in the centre with the pole upright and at rest.
    pub fn reset(&mut self) {
        self.state = CartPoleState::default();
        self.applied_action = 0.0;
        self.terminated = false;
        self.reset_count += 1;
    }

    pub fn state(&self) -> CartPoleState {
        self.state
    }

    /// Place the cart and pole in an arbitrary state.
    pub fn set_state(
        &mut self,
        state: CartPoleState,
    ) {
        self.state = state;
    }

    pub fn applied_action(&self) -> f64 {
        self.applied_action
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }

    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    /// Add `delta` to the cumulative applied action, clamped to `[-1, 1]`.
    /// A non-finite `delta` is ignored.
    pub fn apply_action(
        &mut self,
        delta: f64,
    ) {
        if delta.is_finite() {
            self.applied_action = (self.applied_action + delta).clamp(-1.0, 1.0);
        }
    }

    /// Whether `state` at `step_index` ends the episode.
    ///
    /// Being exactly at a bound is still allowed. A state with any
    /// non-finite component always terminates.
    pub fn is_terminated(
        &self,
        state: &CartPoleState,
        step_index: usize,
    ) -> bool {
        !state.is_finite()
            || state.position.abs() > self.config.position_bound
            || state.angle.abs() > self.config.angle_bound
            || step_index > self.config.max_steps
    }

    /// Integrate one timestep of length `dt` under `force`.
    ///
    /// Never fails; numerically extreme states simply terminate the episode.
    pub fn step(
        &mut self,
        force: f64,
        dt: f64,
        step_index: usize,
    ) -> (CartPoleState, bool) {
        self.state = integrate(&self.config, self.state, force, dt);
        self.terminated = self.is_terminated(&self.state, step_index);

        info!(
            concat!(
                "\nCart-pole step {}:",
                "\nF({:.3}) --> {} (terminated: {})",
            ),
            step_index, force, self.state, self.terminated,
        );

        (self.state, self.terminated)
    }

    /// Integrate one timestep using the cumulative applied action as force.
    pub fn tick(
        &mut self,
        dt: f64,
        step_index: usize,
    ) -> (CartPoleState, bool) {
        self.step(self.applied_action * self.config.force_scale, dt, step_index)
    }

    pub fn reward(
        &self,
        state: &CartPoleState,
        terminated: bool,
    ) -> f64 {
        self.config.reward.compute(
            state,
            terminated,
            self.config.position_bound,
            self.config.angle_bound,
        )
    }
}
