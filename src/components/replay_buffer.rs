use {
    rand::{
        seq::index,
        Rng,
    },
    unzip_n::unzip_n,
};

unzip_n!(4);

/// A transition in the replay buffer.
///
/// # Fields
///
/// * `state` - The state the action was taken in.
/// * `action` - The action taken.
/// * `reward` - The reward received.
/// * `next_state` - The state the action led to.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f64>,
    pub action: Vec<f64>,
    pub reward: f64,
    pub next_state: Vec<f64>,
}
impl Transition {
    pub fn new(
        state: &[f64],
        action: &[f64],
        reward: f64,
        next_state: &[f64],
    ) -> Self {
        Self {
            state: state.to_vec(),
            action: action.to_vec(),
            reward,
            next_state: next_state.to_vec(),
        }
    }
}

/// A minibatch of transitions, split column-wise.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub states: Vec<Vec<f64>>,
    pub actions: Vec<Vec<f64>>,
    pub rewards: Vec<f64>,
    pub next_states: Vec<Vec<f64>>,
}
impl Batch {
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// A replay buffer for off-policy algorithms.
///
/// The replay buffer is a fixed-capacity ring buffer. Until it is full new
/// transitions are appended; afterwards the write cursor walks over the
/// slots in insertion order so the oldest transition is always the next one
/// to be overwritten.
///
/// # Fields
///
/// * `buffer` - The stored transitions, `buffer.len()` is the valid count.
/// * `capacity` - The capacity of the buffer.
/// * `cursor` - The slot that will be overwritten next once the buffer is full.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    cursor: usize,
}
impl ReplayBuffer {
    /// Create a new replay buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Iterate over the valid transitions in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Push a transition into the buffer.
    ///
    /// If the buffer is full, the oldest transition is overwritten. A
    /// transition without a previous state is not stored and `false` is
    /// returned.
    pub fn push(
        &mut self,
        transition: Transition,
    ) -> bool {
        if transition.state.is_empty() || self.capacity == 0 {
            return false;
        }
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.cursor] = transition;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
        true
    }

    /// Draw `batch_size` distinct slot indices uniformly from the valid range.
    ///
    /// When the buffer holds fewer than twice the batch size, `None` is returned.
    pub fn sample_indices<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Option<Vec<usize>> {
        if batch_size == 0 || self.buffer.len() < 2 * batch_size {
            None
        } else {
            Some(index::sample(rng, self.buffer.len(), batch_size).into_vec())
        }
    }

    /// Sample a random batch of distinct transitions from the buffer.
    ///
    /// When the buffer holds fewer than twice the batch size, `None` is returned.
    pub fn random_batch<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Option<Batch> {
        let indices = self.sample_indices(batch_size, rng)?;

        let (states, actions, rewards, next_states) = indices
            .into_iter()
            .map(|i| &self.buffer[i])
            .map(|t| (t.state.clone(), t.action.clone(), t.reward, t.next_state.clone()))
            .unzip_n_vec();

        Some(Batch {
            states,
            actions,
            rewards,
            next_states,
        })
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        rand::{
            rngs::StdRng,
            SeedableRng,
        },
        std::collections::HashSet,
    };

    fn transition(i: usize) -> Transition {
        let i = i as f64;
        Transition::new(&[i, 0.0, 0.0, 0.0], &[0.0], i, &[i + 1.0, 0.0, 0.0, 0.0])
    }

    #[test]
    fn fills_up_to_capacity() {
        let mut buffer = ReplayBuffer::new(4);
        assert!(buffer.is_empty());
        for i in 0..3 {
            assert!(buffer.push(transition(i)));
        }
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_full());
        buffer.push(transition(3));
        assert!(buffer.is_full());
    }

    #[test]
    fn overwrites_the_oldest_transitions_first() {
        let capacity = 5;
        for k in 1..=7 {
            let mut buffer = ReplayBuffer::new(capacity);
            for i in 0..capacity + k {
                buffer.push(transition(i));
            }
            assert_eq!(buffer.len(), capacity);

            let rewards: HashSet<usize> = buffer.iter().map(|t| t.reward as usize).collect();
            let expected: HashSet<usize> = (k..capacity + k).collect();
            assert_eq!(rewards, expected);
        }
    }

    #[test]
    fn transitions_without_previous_state_are_dropped() {
        let mut buffer = ReplayBuffer::new(4);
        assert!(!buffer.push(Transition::new(&[], &[0.5], 1.0, &[1.0, 2.0, 3.0, 4.0])));
        assert!(buffer.is_empty());
    }

    #[test]
    fn sampling_needs_twice_the_batch_size() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut buffer = ReplayBuffer::new(100);
        for i in 0..7 {
            buffer.push(transition(i));
        }
        assert!(buffer.sample_indices(4, &mut rng).is_none());
        assert!(buffer.random_batch(4, &mut rng).is_none());

        buffer.push(transition(7));
        assert!(buffer.sample_indices(4, &mut rng).is_some());
        assert!(buffer.sample_indices(0, &mut rng).is_none());
    }

    #[test]
    fn samples_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut buffer = ReplayBuffer::new(64);
        for i in 0..40 {
            buffer.push(transition(i));
        }
        for _ in 0..200 {
            let indices = buffer.sample_indices(20, &mut rng).unwrap();
            assert_eq!(indices.len(), 20);
            assert!(indices.iter().all(|&i| i < 40));
            let unique: HashSet<usize> = indices.iter().copied().collect();
            assert_eq!(unique.len(), 20);
        }
    }

    #[test]
    fn batches_keep_the_columns_aligned() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buffer = ReplayBuffer::new(16);
        for i in 0..16 {
            buffer.push(transition(i));
        }
        let batch = buffer.random_batch(8, &mut rng).unwrap();
        assert_eq!(batch.len(), 8);
        for i in 0..batch.len() {
            assert_eq!(batch.states[i][0], batch.rewards[i]);
            assert_eq!(batch.next_states[i][0], batch.rewards[i] + 1.0);
            assert_eq!(batch.actions[i], vec![0.0]);
        }
    }
}
