use {
    super::{
        DDPGConfig,
        FunctionApproximator,
        Network,
    },
    crate::errors::CheckpointError,
    anyhow::{
        anyhow,
        Result,
    },
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    rand_distr::Uniform,
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs,
        path::PathBuf,
    },
};

/// A dense layer `y = W x + b` stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Dense {
    inputs: usize,
    outputs: usize,
    weight: Vec<f64>,
    bias: Vec<f64>,
}
impl Dense {
    fn new(
        inputs: usize,
        outputs: usize,
        rng: &mut StdRng,
    ) -> Self {
        // same bound as the default kaiming-uniform init of a linear layer
        let bound = 1.0 / (inputs as f64).sqrt();
        let dist = Uniform::new_inclusive(-bound, bound);
        Self {
            inputs,
            outputs,
            weight: (0..inputs * outputs).map(|_| rng.sample(dist)).collect(),
            bias: (0..outputs).map(|_| rng.sample(dist)).collect(),
        }
    }

    fn forward(
        &self,
        x: &[f64],
    ) -> Vec<f64> {
        (0..self.outputs)
            .map(|j| {
                let row = &self.weight[j * self.inputs..(j + 1) * self.inputs];
                row.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + self.bias[j]
            })
            .collect()
    }

    fn parameters(&self) -> Vec<Vec<f64>> {
        vec![self.weight.clone(), self.bias.clone()]
    }

    fn set_parameters(
        &mut self,
        parameters: &[Vec<f64>],
    ) -> Result<()> {
        match parameters {
            [weight, bias] if weight.len() == self.weight.len() && bias.len() == self.bias.len() => {
                self.weight.clone_from(weight);
                self.bias.clone_from(bias);
                Ok(())
            }
            _ => Err(anyhow!(
                "expected a {}x{} weight and a bias of {}",
                self.outputs,
                self.inputs,
                self.outputs,
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Checkpoint {
    actor: Dense,
    critic: Dense,
}

fn check_batch(
    rows: &[Vec<f64>],
    size: usize,
    what: &str,
) -> Result<()> {
    match rows.iter().find(|row| row.len() != size) {
        Some(row) => Err(anyhow!("{what} of size {} where {size} was expected", row.len())),
        None => Ok(()),
    }
}

/// A linear critic and a `tanh`-squashed linear actor.
///
/// The layer lists of the [`DDPGConfig`] are ignored, both networks map
/// their input straight to their output. Gradients are derived by hand and
/// applied with plain stochastic gradient descent, so for a given seed
/// every run is exactly reproducible.
#[derive(Debug, Clone)]
pub struct LinearApproximator {
    actor: Dense,
    target_actor: Dense,
    critic: Dense,
    target_critic: Dense,
    actor_lr: f64,
    critic_lr: f64,
    size_state: usize,
    size_action: usize,
}
impl LinearApproximator {
    pub fn new(
        size_state: usize,
        size_action: usize,
        actor_lr: f64,
        critic_lr: f64,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let actor = Dense::new(size_state, size_action, &mut rng);
        let critic = Dense::new(size_state + size_action, 1, &mut rng);
        Self {
            target_actor: actor.clone(),
            target_critic: critic.clone(),
            actor,
            critic,
            actor_lr,
            critic_lr,
            size_state,
            size_action,
        }
    }

    fn network(
        &self,
        network: Network,
    ) -> &Dense {
        match network {
            Network::Actor => &self.actor,
            Network::Critic => &self.critic,
            Network::TargetActor => &self.target_actor,
            Network::TargetCritic => &self.target_critic,
        }
    }

    fn network_mut(
        &mut self,
        network: Network,
    ) -> &mut Dense {
        match network {
            Network::Actor => &mut self.actor,
            Network::Critic => &mut self.critic,
            Network::TargetActor => &mut self.target_actor,
            Network::TargetCritic => &mut self.target_critic,
        }
    }

    fn act(
        actor: &Dense,
        states: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        states
            .iter()
            .map(|s| actor.forward(s).into_iter().map(f64::tanh).collect())
            .collect()
    }

    fn evaluate(
        critic: &Dense,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Vec<f64> {
        states
            .iter()
            .zip(actions)
            .map(|(s, a)| critic.forward(&[s.as_slice(), a.as_slice()].concat())[0])
            .collect()
    }

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("{name}-linear.ron"))
    }
}

/// The noise draws from `seed` and the minibatch sampler from `seed + 1`,
/// so weight initialization gets a stream of its own.
const INIT_SEED_OFFSET: u64 = 2;

impl FunctionApproximator for LinearApproximator {
    fn from_config(config: &DDPGConfig) -> Result<Self> {
        config.check()?;
        Ok(Self::new(
            config.num_inputs,
            config.num_outputs,
            config.actor_lr,
            config.critic_lr,
            config.seed.wrapping_add(INIT_SEED_OFFSET),
        ))
    }

    fn predict_actor(
        &self,
        states: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        check_batch(states, self.size_state, "state")?;
        Ok(Self::act(&self.actor, states))
    }

    fn predict_target_actor(
        &self,
        states: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        check_batch(states, self.size_state, "state")?;
        Ok(Self::act(&self.target_actor, states))
    }

    fn predict_critic(
        &self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Result<Vec<f64>> {
        check_batch(states, self.size_state, "state")?;
        check_batch(actions, self.size_action, "action")?;
        Ok(Self::evaluate(&self.critic, states, actions))
    }

    fn predict_target_critic(
        &self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Result<Vec<f64>> {
        check_batch(states, self.size_state, "state")?;
        check_batch(actions, self.size_action, "action")?;
        Ok(Self::evaluate(&self.target_critic, states, actions))
    }

    fn update_critic(
        &mut self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<f64> {
        let q = self.predict_critic(states, actions)?;
        if q.len() != targets.len() || q.is_empty() {
            return Err(anyhow!("{} critic values for {} targets", q.len(), targets.len()));
        }
        let n = q.len() as f64;

        let mut grad_w = vec![0.0; self.critic.weight.len()];
        let mut grad_b = 0.0;
        let mut loss = 0.0;
        for ((s, a), (q, y)) in states.iter().zip(actions).zip(q.iter().zip(targets)) {
            let diff = q - y;
            loss += diff * diff / n;
            for (g, x) in grad_w.iter_mut().zip(s.iter().chain(a.iter())) {
                *g += 2.0 * diff * x / n;
            }
            grad_b += 2.0 * diff / n;
        }

        for (w, g) in self.critic.weight.iter_mut().zip(grad_w) {
            *w -= self.critic_lr * g;
        }
        self.critic.bias[0] -= self.critic_lr * grad_b;
        Ok(loss)
    }

    fn update_actor(
        &mut self,
        states: &[Vec<f64>],
    ) -> Result<f64> {
        let actions = self.predict_actor(states)?;
        if actions.is_empty() {
            return Err(anyhow!("cannot update the actor on an empty batch"));
        }
        let n = actions.len() as f64;
        let objective = Self::evaluate(&self.critic, states, &actions).iter().sum::<f64>() / n;

        // dQ/da is constant for a linear critic
        let dq_da = &self.critic.weight[self.size_state..];
        let mut grad_w = vec![0.0; self.actor.weight.len()];
        let mut grad_b = vec![0.0; self.actor.bias.len()];
        for (s, a) in states.iter().zip(actions.iter()) {
            for j in 0..self.size_action {
                let delta = dq_da[j] * (1.0 - a[j] * a[j]) / n;
                grad_b[j] += delta;
                for (i, x) in s.iter().enumerate() {
                    grad_w[j * self.size_state + i] += delta * x;
                }
            }
        }

        for (w, g) in self.actor.weight.iter_mut().zip(grad_w) {
            *w += self.actor_lr * g;
        }
        for (b, g) in self.actor.bias.iter_mut().zip(grad_b) {
            *b += self.actor_lr * g;
        }
        Ok(-objective)
    }

    fn parameters(
        &self,
        network: Network,
    ) -> Result<Vec<Vec<f64>>> {
        Ok(self.network(network).parameters())
    }

    fn set_parameters(
        &mut self,
        network: Network,
        parameters: &[Vec<f64>],
    ) -> Result<()> {
        self.network_mut(network).set_parameters(parameters)
    }

    fn save(
        &self,
        name: &str,
    ) -> Result<()> {
        let checkpoint = Checkpoint {
            actor: self.actor.clone(),
            critic: self.critic.clone(),
        };
        fs::write(
            Self::path(name),
            ron::ser::to_string_pretty(&checkpoint, ron::ser::PrettyConfig::default())?,
        )?;
        Ok(())
    }

    fn load(
        &mut self,
        name: &str,
    ) -> Result<(), CheckpointError> {
        let path = Self::path(name);
        if !path.is_file() {
            return Err(CheckpointError::NotFound(path));
        }
        let unreadable = |reason: String| CheckpointError::Unreadable {
            path: path.clone(),
            reason,
        };
        let text = fs::read_to_string(&path).map_err(|e| unreadable(e.to_string()))?;
        let checkpoint: Checkpoint = ron::from_str(&text).map_err(|e| unreadable(e.to_string()))?;
        self.actor
            .set_parameters(&checkpoint.actor.parameters())
            .map_err(|e| unreadable(e.to_string()))?;
        self.critic
            .set_parameters(&checkpoint.critic.parameters())
            .map_err(|e| unreadable(e.to_string()))?;
        Ok(())
    }
}
