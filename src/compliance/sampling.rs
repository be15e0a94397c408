//! Multi-site sample-size rule (IAF MD1).
//!
//! The planner is deterministic: the same inputs always produce the same
//! numeric breakdown, which is what makes a recorded sampling plan
//! reproducible when the audit file is re-examined years later.

use serde::{Deserialize, Serialize};

/// How far the certification scope varies across the organization's sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScopeVariation {
    None,
    Moderate,
    High,
}

/// Tunable constants of the sampling rule. Injected at construction so
/// jurisdiction-specific rule changes do not require recompiling the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingRules {
    /// One extra site per this many high-risk sites.
    pub high_risk_divisor: u32,
    /// Previous-findings count above which one extra site is sampled.
    pub findings_history_threshold: u32,
    /// Extra sites for moderate scope variation.
    pub moderate_scope_bump: u32,
    /// Extra sites for high scope variation.
    pub high_scope_bump: u32,
    /// The total adjustment is capped at this fraction of the base.
    pub adjustment_cap_ratio: f64,
}

impl Default for SamplingRules {
    fn default() -> Self {
        Self {
            high_risk_divisor: 5,
            findings_history_threshold: 3,
            moderate_scope_bump: 1,
            high_scope_bump: 2,
            adjustment_cap_ratio: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingInputs {
    pub total_sites: u32,
    pub high_risk_sites: u32,
    pub previous_findings_count: u32,
    pub is_initial_certification: bool,
    pub scope_variation: ScopeVariation,
}

/// Per-factor contribution to the minimum, recorded alongside the result so
/// the plan can be justified to an accreditation assessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingBreakdown {
    pub base: u32,
    pub risk_adjustment: u32,
    pub history_adjustment: u32,
    pub scope_adjustment: u32,
    pub adjustment_cap: u32,
    pub applied_adjustment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub minimum_sites: u32,
    pub breakdown: SamplingBreakdown,
    pub justification: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCheck {
    pub ok: bool,
    pub shortfall: u32,
}

#[derive(Debug, Clone)]
pub struct SamplingPlanner {
    rules: SamplingRules,
}

impl SamplingPlanner {
    pub fn new(rules: SamplingRules) -> Self {
        Self { rules }
    }

    /// Minimum number of sites to visit for the given organization profile.
    ///
    /// Base is `ceil(sqrt(total))` for an initial certification and
    /// `max(1, ceil(sqrt(total) - 0.5))` for surveillance; risk, history and
    /// scope adjustments are added on top, capped at a fraction of the base.
    /// A single-site organization is not a multi-site audit at all and always
    /// yields 1.
    pub fn calculate(&self, inputs: &SamplingInputs) -> SamplingPlan {
        if inputs.total_sites <= 1 {
            let breakdown = SamplingBreakdown {
                base: 1,
                risk_adjustment: 0,
                history_adjustment: 0,
                scope_adjustment: 0,
                adjustment_cap: 0,
                applied_adjustment: 0,
            };
            return SamplingPlan {
                minimum_sites: 1,
                breakdown,
                justification: "Single-site organization: the multi-site sampling rule does not apply; the one site must be visited.".to_string(),
            };
        }

        let sqrt = (inputs.total_sites as f64).sqrt();
        let base = if inputs.is_initial_certification {
            sqrt.ceil() as u32
        } else {
            ((sqrt - 0.5).ceil() as u32).max(1)
        };

        let risk_adjustment = div_ceil(inputs.high_risk_sites, self.rules.high_risk_divisor);
        let history_adjustment =
            if inputs.previous_findings_count > self.rules.findings_history_threshold {
                1
            } else {
                0
            };
        let scope_adjustment = match inputs.scope_variation {
            ScopeVariation::None => 0,
            ScopeVariation::Moderate => self.rules.moderate_scope_bump,
            ScopeVariation::High => self.rules.high_scope_bump,
        };

        let adjustment_cap = (self.rules.adjustment_cap_ratio * base as f64).ceil() as u32;
        let raw_adjustment = risk_adjustment + history_adjustment + scope_adjustment;
        let applied_adjustment = raw_adjustment.min(adjustment_cap);
        let minimum_sites = (base + applied_adjustment).max(1);

        let breakdown = SamplingBreakdown {
            base,
            risk_adjustment,
            history_adjustment,
            scope_adjustment,
            adjustment_cap,
            applied_adjustment,
        };

        let audit_kind = if inputs.is_initial_certification {
            "initial certification"
        } else {
            "surveillance"
        };
        let justification = format!(
            "{} of {} sites: base sample {} (sqrt rule), adjustments {} (risk {}, history {}, scope {}) capped at {}, minimum {} sites.",
            audit_kind,
            inputs.total_sites,
            base,
            raw_adjustment,
            risk_adjustment,
            history_adjustment,
            scope_adjustment,
            adjustment_cap,
            minimum_sites,
        );

        SamplingPlan {
            minimum_sites,
            breakdown,
            justification,
        }
    }

    /// Check a concrete site selection against a previously computed minimum.
    pub fn validate_selection(&self, selected_sites: u32, minimum_sites: u32) -> SelectionCheck {
        let shortfall = minimum_sites.saturating_sub(selected_sites);
        SelectionCheck {
            ok: shortfall == 0,
            shortfall,
        }
    }
}

impl Default for SamplingPlanner {
    fn default() -> Self {
        Self::new(SamplingRules::default())
    }
}

fn div_ceil(value: u32, divisor: u32) -> u32 {
    if divisor == 0 {
        return 0;
    }
    value.div_ceil(divisor)
}
