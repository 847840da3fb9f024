use crate::policy::CompressionPolicy;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

/// Snapshot of the adaptive state of a compression session.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FeedbackState {
    /// Number of effort steps the session retreated from the policy's ideal level.
    pub backoff: u32,
    /// The usable level range is exhausted and the backoff is frozen.
    pub ended: bool,
    /// Total uncompressed bytes fed into the session.
    pub raw_bytes: u64,
    /// Total compressed bytes produced by the session (frame headers excluded).
    pub compressed_bytes: u64,
    /// Ideal level reported by the most recent compress call.
    pub ideal_level: Option<u32>,
    /// Effort level used by the most recent compress call.
    pub last_level: Option<u32>,
}

/// Feedback state shared by all compress calls of one logical stream
/// (typically one column within a writer session).
///
/// Every compress call reads the current backoff to pick its effort level
/// ([`CompressResult::select_level`]), and reports the achieved sizes afterwards
/// ([`CompressResult::feed_back`]). Both steps take a short lock; the
/// compression itself runs outside of it, so the state can be shared between
/// threads.
///
/// The backoff never decreases. When a configured allowed ratio is exceeded by
/// a block, the next block is compressed one level lower. Once another step
/// would take the level below 1, the session is marked ended, the backoff
/// stays at `ideal - 1` and every subsequent call uses level 1.
#[derive(Debug)]
pub struct CompressResult {
    policy: CompressionPolicy,
    allowed_ratio: Option<f64>,
    state: Mutex<FeedbackState>,
}

impl CompressResult {
    pub fn new(policy: CompressionPolicy) -> Self {
        Self {
            policy,
            allowed_ratio: None,
            state: Mutex::new(FeedbackState::default()),
        }
    }

    /// Sets the largest acceptable `compressed / raw` ratio. A block compressed
    /// worse than that lowers the effort level of subsequent blocks.
    pub fn with_allowed_ratio(mut self, ratio: f64) -> Self {
        self.allowed_ratio = Some(ratio);
        self
    }

    fn with_settings(policy: CompressionPolicy, allowed_ratio: Option<f64>) -> Self {
        let mut result = Self::new(policy);
        result.allowed_ratio = allowed_ratio;
        result
    }

    pub fn policy(&self) -> CompressionPolicy {
        self.policy
    }

    pub fn allowed_ratio(&self) -> Option<f64> {
        self.allowed_ratio
    }

    /// Picks the effort level for the upcoming compress call, given the ideal
    /// level of the compressor for this session's policy.
    ///
    /// The range check happens before compressing: a call whose level would
    /// drop below 1 ends the session and already uses level 1.
    pub fn select_level(&self, ideal: u32) -> u32 {
        let ideal = ideal.max(1);
        let mut state = self.state.lock().unwrap();
        state.ideal_level = Some(ideal);
        if state.backoff >= ideal {
            self.end(&mut state);
        }
        let level = ideal.saturating_sub(state.backoff).max(1);
        state.last_level = Some(level);
        level
    }

    /// Records the outcome of a compress call.
    pub fn feed_back(&self, raw_size: usize, compressed_size: usize) {
        let mut state = self.state.lock().unwrap();
        state.raw_bytes += raw_size as u64;
        state.compressed_bytes += compressed_size as u64;
        if state.ended || raw_size == 0 {
            return;
        }
        let Some(allowed_ratio) = self.allowed_ratio else {
            return;
        };
        if compressed_size as f64 / raw_size as f64 <= allowed_ratio {
            return;
        }
        match state.ideal_level {
            Some(ideal) if state.backoff + 1 >= ideal => self.end(&mut state),
            _ => state.backoff += 1,
        }
    }

    fn end(&self, state: &mut FeedbackState) {
        if !state.ended {
            log::debug!(
                "compression level range exhausted (policy {:?}, ideal level {:?}, backoff {})",
                self.policy,
                state.ideal_level,
                state.backoff
            );
        }
        state.ended = true;
    }

    pub fn state(&self) -> FeedbackState {
        *self.state.lock().unwrap()
    }

    pub fn backoff(&self) -> u32 {
        self.state().backoff
    }

    pub fn is_ended(&self) -> bool {
        self.state().ended
    }

    /// Overall `compressed / raw` ratio of the session so far.
    pub fn compression_ratio(&self) -> Option<f64> {
        let state = self.state();
        (state.raw_bytes > 0).then(|| state.compressed_bytes as f64 / state.raw_bytes as f64)
    }
}

/// Tree of [`CompressResult`]s mirroring the column tree of a writer session.
///
/// Child nodes are created on first access and inherit the default policy and
/// allowed ratio of their parent. The feedback state of a node is created on
/// first use, either with those defaults ([`CompressResultNode::result`]) or
/// with the settings of the column's effective config
/// ([`CompressResultNode::result_with`]); the first use wins.
#[derive(Debug)]
pub struct CompressResultNode {
    policy: CompressionPolicy,
    allowed_ratio: Option<f64>,
    result: OnceLock<CompressResult>,
    children: Mutex<HashMap<String, Arc<CompressResultNode>>>,
}

impl CompressResultNode {
    pub fn new(policy: CompressionPolicy) -> Self {
        Self {
            policy,
            allowed_ratio: None,
            result: OnceLock::new(),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the default allowed ratio of this node and of children created
    /// from it afterwards.
    pub fn with_allowed_ratio(mut self, ratio: f64) -> Self {
        self.allowed_ratio = Some(ratio);
        self
    }

    pub fn from_result(result: CompressResult) -> Self {
        Self {
            policy: result.policy,
            allowed_ratio: result.allowed_ratio,
            result: OnceLock::from(result),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Feedback state of this node, created with the node's defaults if it
    /// does not exist yet.
    pub fn result(&self) -> &CompressResult {
        self.result_with(self.policy, self.allowed_ratio)
    }

    /// Feedback state of this node, created with the given settings if it
    /// does not exist yet.
    pub fn result_with(
        &self,
        policy: CompressionPolicy,
        allowed_ratio: Option<f64>,
    ) -> &CompressResult {
        self.result
            .get_or_init(|| CompressResult::with_settings(policy, allowed_ratio))
    }

    /// Returns the child node for the given column name, creating it if needed.
    pub fn child(&self, name: &str) -> Arc<CompressResultNode> {
        let mut children = self.children.lock().unwrap();
        children
            .entry(name.to_string())
            .or_insert_with(|| {
                let mut child = CompressResultNode::new(self.policy);
                child.allowed_ratio = self.allowed_ratio;
                Arc::new(child)
            })
            .clone()
    }
}
