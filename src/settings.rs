//! Builder-style configuration for a cluster policy, mirroring the teacher's
//! `ContractionParams`/`PriorityParams` fluent-setter shape.
use crate::merge_rules::MergeRule;

/// Settings shared by the edge-weighted and GASP/probabilistic policies.
#[derive(Clone, Debug)]
pub struct ClusterPolicySettings {
    pub stop_nodes: usize,
    pub stop_priority: f64,
    pub size_regularizer: f64,
    pub size_thresh_min: f64,
    pub size_thresh_max: f64,
    pub postpone_thresholding: bool,
    pub zero_init: bool,
    pub threshold: f64,
    pub merge_rule_0: MergeRule,
    pub merge_rule_1: MergeRule,
}

impl ClusterPolicySettings {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn stop_nodes(mut self, n: usize) -> Self {
        self.stop_nodes = n;
        self
    }

    pub fn stop_priority(mut self, p: f64) -> Self {
        self.stop_priority = p;
        self
    }

    pub fn size_regularizer(mut self, lambda: f64) -> Self {
        self.size_regularizer = lambda;
        self
    }

    pub fn size_thresh_min(mut self, t: f64) -> Self {
        self.size_thresh_min = t;
        self
    }

    pub fn size_thresh_max(mut self, t: f64) -> Self {
        self.size_thresh_max = t;
        self
    }

    pub fn postpone_thresholding(mut self, v: bool) -> Self {
        self.postpone_thresholding = v;
        self
    }

    pub fn zero_init(mut self, v: bool) -> Self {
        self.zero_init = v;
        self
    }

    pub fn threshold(mut self, t: f64) -> Self {
        self.threshold = t;
        self
    }

    pub fn merge_rule_0(mut self, rule: MergeRule) -> Self {
        self.merge_rule_0 = rule;
        self
    }

    pub fn merge_rule_1(mut self, rule: MergeRule) -> Self {
        self.merge_rule_1 = rule;
        self
    }
}

// GASP defaults, matching the reference's own defaults for the probabilistic policy
// (threshold 0.5, no size regularization, arithmetic-mean merging of both accumulators).
impl Default for ClusterPolicySettings {
    fn default() -> Self {
        ClusterPolicySettings {
            stop_nodes: 1,
            stop_priority: f64::NEG_INFINITY,
            size_regularizer: 0.0,
            size_thresh_min: 0.0,
            size_thresh_max: f64::INFINITY,
            postpone_thresholding: false,
            zero_init: false,
            threshold: 0.5,
            merge_rule_0: MergeRule::ArithmeticMean,
            merge_rule_1: MergeRule::ArithmeticMean,
        }
    }
}
