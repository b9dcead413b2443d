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
    candle_core::{
        DType,
        Device,
        Error,
        Module,
        Tensor,
        Var,
    },
    candle_nn::{
        func,
        linear,
        sequential::seq,
        Activation,
        AdamW,
        Optimizer,
        ParamsAdamW,
        Sequential,
        VarBuilder,
        VarMap,
    },
    std::path::PathBuf,
};

/// Build `Dense ReLU Dense ... Dense` over the layer dimensions, optionally
/// squashing the output with `tanh`.
fn make_network(
    vb: &VarBuilder,
    prefix: &str,
    dims: &[(usize, usize)],
    squash: bool,
) -> candle_core::Result<Sequential> {
    let mut network = seq();
    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        if i > 0 {
            network = network.add(Activation::Relu);
        }
        network = network.add(linear(in_dim, out_dim, vb.pp(format!("{prefix}-fc{i}")))?);
    }
    if squash {
        network = network.add(func(|xs| xs.tanh()));
    }
    Ok(network)
}

/// The dimensions of each dense layer from input through hidden to output.
fn layer_dims(
    inputs: usize,
    hidden: &[usize],
    outputs: usize,
) -> Vec<(usize, usize)> {
    let sizes: Vec<usize> = std::iter::once(inputs)
        .chain(hidden.iter().copied())
        .chain(std::iter::once(outputs))
        .collect();
    sizes.windows(2).map(|w| (w[0], w[1])).collect()
}

fn to_tensor(
    rows: &[Vec<f64>],
    device: &Device,
) -> Result<Tensor> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != cols) {
        return Err(anyhow!("rows of a batch must all have the same length"));
    }
    Ok(Tensor::from_vec(rows.concat(), (rows.len(), cols), device)?)
}

/// The variables whose name starts with `prefix`, ordered by name.
fn vars_with_prefix(
    varmap: &VarMap,
    prefix: &str,
) -> Result<Vec<Var>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|e| anyhow!("varmap lock poisoned: {e}"))?;
    let mut vars: Vec<(&String, &Var)> = data
        .iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .collect();
    vars.sort_by(|a, b| a.0.cmp(b.0));
    Ok(vars.into_iter().map(|(_, var)| var.clone()).collect())
}

/// A live network with its target copy, sharing one [`VarMap`].
///
/// Variables are named `{prefix}-fc{i}.weight` / `.bias` for the live network
/// and `target-{prefix}-fc{i}.*` for the target.
struct Tracked {
    varmap: VarMap,
    network: Sequential,
    target_network: Sequential,
    prefix: &'static str,
    optimizer: AdamW,
}

impl Tracked {
    fn new(
        device: &Device,
        prefix: &'static str,
        dims: &[(usize, usize)],
        squash: bool,
        lr: f64,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, device);

        let network = make_network(&vb, prefix, dims, squash)?;
        let target_network = make_network(&vb, &format!("target-{prefix}"), dims, squash)?;
        let optimizer = AdamW::new(
            vars_with_prefix(&varmap, &format!("{prefix}-"))?,
            ParamsAdamW {
                lr,
                ..Default::default()
            },
        )?;

        let tracked = Self {
            varmap,
            network,
            target_network,
            prefix,
            optimizer,
        };
        // start with the target equal to the live network
        tracked.set(true, &tracked.get(false)?)?;
        Ok(tracked)
    }

    /// The variables of the live or target network, ordered by name.
    fn vars(
        &self,
        target: bool,
    ) -> Result<Vec<Var>> {
        if target {
            vars_with_prefix(&self.varmap, &format!("target-{}-", self.prefix))
        } else {
            vars_with_prefix(&self.varmap, &format!("{}-", self.prefix))
        }
    }

    fn get(
        &self,
        target: bool,
    ) -> Result<Vec<Vec<f64>>> {
        self.vars(target)?
            .iter()
            .map(|var| Ok(var.as_tensor().flatten_all()?.to_vec1::<f64>()?))
            .collect()
    }

    fn set(
        &self,
        target: bool,
        parameters: &[Vec<f64>],
    ) -> Result<()> {
        let vars = self.vars(target)?;
        if vars.len() != parameters.len() {
            return Err(anyhow!(
                "{} expects {} parameter tensors, got {}",
                self.prefix,
                vars.len(),
                parameters.len(),
            ));
        }
        for (var, values) in vars.iter().zip(parameters) {
            let value = Tensor::from_vec(values.clone(), var.shape().clone(), var.device())?;
            var.set(&value)?;
        }
        Ok(())
    }
}


/// Multilayer perceptron actor and critic on candle.
///
/// The actor is `Dense ReLU ... Dense tanh`, the critic is `Dense ReLU ...
/// Dense` on the concatenated `[state, action]`. Both are optimized with
/// AdamW.
pub struct MlpApproximator {
    device: Device,
    actor: Tracked,
    critic: Tracked,
}

impl MlpApproximator {
    pub fn new(
        device: &Device,
        size_state: usize,
        size_action: usize,
        actor_layers: &[usize],
        critic_layers: &[usize],
        actor_lr: f64,
        critic_lr: f64,
    ) -> Result<Self> {
        if actor_layers.is_empty() || critic_layers.is_empty() {
            return Err(anyhow!("both networks need at least one hidden layer"));
        }
        let actor = Tracked::new(
            device,
            "actor",
            &layer_dims(size_state, actor_layers, size_action),
            true,
            actor_lr,
        )?;
        let critic = Tracked::new(
            device,
            "critic",
            &layer_dims(size_state + size_action, critic_layers, 1),
            false,
            critic_lr,
        )?;
        Ok(Self {
            device: device.clone(),
            actor,
            critic,
        })
    }

    fn critic_input(
        &self,
        states: &[Vec<f64>],
        actions: &Tensor,
    ) -> Result<Tensor> {
        let states = to_tensor(states, &self.device)?;
        Ok(Tensor::cat(&[&states, actions], 1)?)
    }

    fn tracked(
        &self,
        network: Network,
    ) -> (&Tracked, bool) {
        match network {
            Network::Actor => (&self.actor, false),
            Network::Critic => (&self.critic, false),
            Network::TargetActor => (&self.actor, true),
            Network::TargetCritic => (&self.critic, true),
        }
    }

    fn path(
        name: &str,
        network: &str,
    ) -> PathBuf {
        PathBuf::from(format!("{name}-{network}.safetensors"))
    }
}

impl FunctionApproximator for MlpApproximator {
    fn from_config(config: &DDPGConfig) -> Result<Self> {
        config.check()?;
        Self::new(
            &Device::Cpu,
            config.num_inputs,
            config.num_outputs,
            &config.actor_layers,
            &config.critic_layers,
            config.actor_lr,
            config.critic_lr,
        )
    }

    fn predict_actor(
        &self,
        states: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        let xs = to_tensor(states, &self.device)?;
        Ok(self.actor.network.forward(&xs)?.to_vec2::<f64>()?)
    }

    fn predict_target_actor(
        &self,
        states: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>> {
        let xs = to_tensor(states, &self.device)?;
        Ok(self.actor.target_network.forward(&xs)?.to_vec2::<f64>()?)
    }

    fn predict_critic(
        &self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Result<Vec<f64>> {
        let xs = self.critic_input(states, &to_tensor(actions, &self.device)?)?;
        Ok(self.critic.network.forward(&xs)?.squeeze(1)?.to_vec1::<f64>()?)
    }

    fn predict_target_critic(
        &self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
    ) -> Result<Vec<f64>> {
        let xs = self.critic_input(states, &to_tensor(actions, &self.device)?)?;
        Ok(self.critic.target_network.forward(&xs)?.squeeze(1)?.to_vec1::<f64>()?)
    }

    fn update_critic(
        &mut self,
        states: &[Vec<f64>],
        actions: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<f64> {
        let xs = self.critic_input(states, &to_tensor(actions, &self.device)?)?;
        let q = self.critic.network.forward(&xs)?.squeeze(1)?;
        let q_target = Tensor::from_vec(targets.to_vec(), targets.len(), &self.device)?;

        let critic_loss = (q_target - q)?.sqr()?.mean_all()?;
        self.critic.optimizer.backward_step(&critic_loss)?;
        Ok(critic_loss.to_scalar::<f64>()?)
    }

    fn update_actor(
        &mut self,
        states: &[Vec<f64>],
    ) -> Result<f64> {
        let xs = to_tensor(states, &self.device)?;
        let actions = self.actor.network.forward(&xs)?;
        let actor_loss = self
            .critic
            .network
            .forward(&Tensor::cat(&[&xs, &actions], 1)?)?
            .mean_all()?
            .neg()?;
        self.actor.optimizer.backward_step(&actor_loss)?;
        Ok(actor_loss.to_scalar::<f64>()?)
    }

    fn parameters(
        &self,
        network: Network,
    ) -> Result<Vec<Vec<f64>>> {
        let (tracked, target) = self.tracked(network);
        tracked.get(target)
    }

    fn set_parameters(
        &mut self,
        network: Network,
        parameters: &[Vec<f64>],
    ) -> Result<()> {
        let (tracked, target) = self.tracked(network);
        tracked.set(target, parameters)
    }

    fn save(
        &self,
        name: &str,
    ) -> Result<()> {
        self.actor.varmap.save(Self::path(name, "actor"))?;
        self.critic.varmap.save(Self::path(name, "critic"))?;
        Ok(())
    }

    fn load(
        &mut self,
        name: &str,
    ) -> Result<(), CheckpointError> {
        let actor_path = Self::path(name, "actor");
        let critic_path = Self::path(name, "critic");
        for path in [&actor_path, &critic_path] {
            if !path.is_file() {
                return Err(CheckpointError::NotFound(path.clone()));
            }
        }
        let unreadable = |path: &PathBuf, e: Error| CheckpointError::Unreadable {
            path: path.clone(),
            reason: e.to_string(),
        };
        self.actor
            .varmap
            .load(&actor_path)
            .map_err(|e| unreadable(&actor_path, e))?;
        self.critic
            .varmap
            .load(&critic_path)
            .map_err(|e| unreadable(&critic_path, e))?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn approximator() -> MlpApproximator {
        MlpApproximator::new(&Device::Cpu, 4, 1, &[16, 8], &[16, 8], 1e-3, 1e-3).unwrap()
    }

    fn states() -> Vec<Vec<f64>> {
        (0..8)
            .map(|i| {
                let i = i as f64;
                vec![0.1 * i, -0.2 * i, i, 0.5]
            })
            .collect()
    }

    #[test]
    fn layer_dims_chain_inputs_hidden_and_outputs() {
        assert_eq!(layer_dims(4, &[128, 32], 1), vec![(4, 128), (128, 32), (32, 1)]);
        assert_eq!(layer_dims(5, &[7], 1), vec![(5, 7), (7, 1)]);
    }

    #[test]
    fn predictions_have_the_expected_shapes() {
        let approximator = approximator();
        let states = states();
        let actions = approximator.predict_actor(&states).unwrap();
        assert_eq!(actions.len(), 8);
        assert!(actions.iter().all(|a| a.len() == 1 && (-1.0..=1.0).contains(&a[0])));

        let values = approximator.predict_critic(&states, &actions).unwrap();
        assert_eq!(values.len(), 8);
        let targets = approximator.predict_target_critic(&states, &actions).unwrap();
        assert_eq!(values, targets);
    }

    #[test]
    fn targets_start_as_copies() {
        let approximator = approximator();
        assert_eq!(
            approximator.parameters(Network::Actor).unwrap(),
            approximator.parameters(Network::TargetActor).unwrap(),
        );
        assert_eq!(
            approximator.parameters(Network::Critic).unwrap(),
            approximator.parameters(Network::TargetCritic).unwrap(),
        );
    }

    #[test]
    fn updates_only_touch_the_live_network() {
        let mut approximator = approximator();
        let states = states();
        let actions = approximator.predict_actor(&states).unwrap();
        let targets = vec![1.0; states.len()];

        let target_critic = approximator.parameters(Network::TargetCritic).unwrap();
        let critic = approximator.parameters(Network::Critic).unwrap();
        approximator.update_critic(&states, &actions, &targets).unwrap();
        assert_ne!(approximator.parameters(Network::Critic).unwrap(), critic);
        assert_eq!(approximator.parameters(Network::TargetCritic).unwrap(), target_critic);

        let actor = approximator.parameters(Network::Actor).unwrap();
        let critic = approximator.parameters(Network::Critic).unwrap();
        approximator.update_actor(&states).unwrap();
        assert_ne!(approximator.parameters(Network::Actor).unwrap(), actor);
        assert_eq!(approximator.parameters(Network::Critic).unwrap(), critic);
    }

    #[test]
    fn missing_checkpoints_are_reported_as_not_found() {
        let mut approximator = approximator();
        let name = std::env::temp_dir()
            .join(format!("mlp-missing-{}", std::process::id()))
            .to_string_lossy()
            .into_owned();
        assert!(matches!(approximator.load(&name), Err(CheckpointError::NotFound(_))));
    }

    #[test]
    fn checkpoints_restore_the_live_networks() {
        let name = std::env::temp_dir()
            .join(format!("mlp-checkpoint-{}", std::process::id()))
            .to_string_lossy()
            .into_owned();
        let saved = approximator();
        saved.save(&name).unwrap();

        let mut restored = approximator();
        restored.load(&name).unwrap();
        assert_eq!(
            restored.parameters(Network::Actor).unwrap(),
            saved.parameters(Network::Actor).unwrap(),
        );
        for network in ["actor", "critic"] {
            std::fs::remove_file(MlpApproximator::path(&name, network)).unwrap();
        }
    }
}
