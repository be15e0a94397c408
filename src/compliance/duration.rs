//! Minimum audit-duration rule (IAF MD5).
//!
//! Base hours come from an employee-count banding table; a bounded
//! complexity factor scales them up or down; surveillance audits get a
//! fixed fraction of the initial-certification minimum.

use serde::{Deserialize, Serialize};

use super::sampling::ScopeVariation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProcessComplexity {
    Low,
    Standard,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryEnvironment {
    Light,
    Standard,
    Stringent,
}

/// One row of the employee banding table: organizations with up to
/// `max_employees` effective personnel require `base_hours` on site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationBand {
    pub max_employees: u32,
    pub base_hours: f64,
}

/// Tunable constants of the duration rule, injected at construction.
/// The banding table sits last so the serialized TOML keeps scalar keys
/// ahead of the array of tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRules {
    /// Block size for the linear scaling rule above the largest band.
    pub employees_per_extra_block: u32,
    /// Hours added per extra block above the largest band.
    pub hours_per_extra_block: f64,
    /// Factor increment per site beyond the first.
    pub per_site_increment: f64,
    /// Cap on the total multi-site increment.
    pub site_increment_cap: f64,
    pub moderate_scope_adjustment: f64,
    pub high_scope_adjustment: f64,
    pub low_complexity_adjustment: f64,
    pub high_complexity_adjustment: f64,
    pub light_regulatory_adjustment: f64,
    pub stringent_regulatory_adjustment: f64,
    pub outsourced_adjustment: f64,
    pub previous_major_nc_adjustment: f64,
    /// The aggregate complexity factor is clamped to this range.
    pub factor_floor: f64,
    pub factor_ceiling: f64,
    /// Fraction of the initial-certification minimum required for a
    /// surveillance audit.
    pub surveillance_multiplier: f64,
    /// Shortfalls at or below this many hours are a warning, above it
    /// critical.
    pub warning_threshold_hours: f64,
    /// Ascending banding table; employee counts above the last band scale
    /// linearly.
    pub bands: Vec<DurationBand>,
}

impl Default for DurationRules {
    fn default() -> Self {
        Self {
            bands: vec![
                DurationBand { max_employees: 5, base_hours: 16.0 },
                DurationBand { max_employees: 10, base_hours: 24.0 },
                DurationBand { max_employees: 25, base_hours: 32.0 },
                DurationBand { max_employees: 45, base_hours: 40.0 },
                DurationBand { max_employees: 65, base_hours: 48.0 },
                DurationBand { max_employees: 85, base_hours: 56.0 },
                DurationBand { max_employees: 125, base_hours: 64.0 },
                DurationBand { max_employees: 175, base_hours: 72.0 },
                DurationBand { max_employees: 275, base_hours: 80.0 },
                DurationBand { max_employees: 425, base_hours: 88.0 },
                DurationBand { max_employees: 625, base_hours: 96.0 },
                DurationBand { max_employees: 875, base_hours: 104.0 },
                DurationBand { max_employees: 1175, base_hours: 112.0 },
                DurationBand { max_employees: 1550, base_hours: 120.0 },
                DurationBand { max_employees: 2025, base_hours: 128.0 },
                DurationBand { max_employees: 2675, base_hours: 136.0 },
                DurationBand { max_employees: 3450, base_hours: 144.0 },
                DurationBand { max_employees: 4350, base_hours: 152.0 },
                DurationBand { max_employees: 5450, base_hours: 160.0 },
                DurationBand { max_employees: 6800, base_hours: 168.0 },
                DurationBand { max_employees: 8500, base_hours: 176.0 },
                DurationBand { max_employees: 10500, base_hours: 184.0 },
            ],
            employees_per_extra_block: 2000,
            hours_per_extra_block: 8.0,
            per_site_increment: 0.05,
            site_increment_cap: 0.15,
            moderate_scope_adjustment: 0.05,
            high_scope_adjustment: 0.10,
            low_complexity_adjustment: -0.10,
            high_complexity_adjustment: 0.15,
            light_regulatory_adjustment: -0.05,
            stringent_regulatory_adjustment: 0.10,
            outsourced_adjustment: 0.08,
            previous_major_nc_adjustment: 0.10,
            factor_floor: 0.8,
            factor_ceiling: 1.3,
            surveillance_multiplier: 0.67,
            warning_threshold_hours: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationInputs {
    pub planned_hours: f64,
    pub employee_count: u32,
    pub is_initial_certification: bool,
    pub number_of_sites: u32,
    pub process_complexity: ProcessComplexity,
    pub scope_variation: ScopeVariation,
    pub regulatory_environment: RegulatoryEnvironment,
    pub outsourced_processes: bool,
    pub previous_major_ncs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSeverity {
    Compliant,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationAssessment {
    pub is_valid: bool,
    pub required_minimum: f64,
    pub shortfall_hours: f64,
    pub severity: DurationSeverity,
    pub recommendation: String,
}

#[derive(Debug, Clone)]
pub struct DurationValidator {
    rules: DurationRules,
}

impl DurationValidator {
    pub fn new(rules: DurationRules) -> Self {
        Self { rules }
    }

    /// Base hours for the employee count, with linear scaling above the
    /// largest band.
    fn base_hours(&self, employee_count: u32) -> f64 {
        for band in &self.rules.bands {
            if employee_count <= band.max_employees {
                return band.base_hours;
            }
        }
        let top = match self.rules.bands.last() {
            Some(band) => band,
            None => return 0.0,
        };
        let excess = employee_count - top.max_employees;
        let blocks = excess.div_ceil(self.rules.employees_per_extra_block.max(1));
        top.base_hours + blocks as f64 * self.rules.hours_per_extra_block
    }

    /// Aggregate complexity factor, clamped to the configured bounds.
    fn complexity_factor(&self, inputs: &DurationInputs) -> f64 {
        let rules = &self.rules;
        let mut factor = 1.0;

        let extra_sites = inputs.number_of_sites.saturating_sub(1);
        factor += (extra_sites as f64 * rules.per_site_increment).min(rules.site_increment_cap);

        factor += match inputs.scope_variation {
            ScopeVariation::None => 0.0,
            ScopeVariation::Moderate => rules.moderate_scope_adjustment,
            ScopeVariation::High => rules.high_scope_adjustment,
        };
        factor += match inputs.process_complexity {
            ProcessComplexity::Low => rules.low_complexity_adjustment,
            ProcessComplexity::Standard => 0.0,
            ProcessComplexity::High => rules.high_complexity_adjustment,
        };
        factor += match inputs.regulatory_environment {
            RegulatoryEnvironment::Light => rules.light_regulatory_adjustment,
            RegulatoryEnvironment::Standard => 0.0,
            RegulatoryEnvironment::Stringent => rules.stringent_regulatory_adjustment,
        };
        if inputs.outsourced_processes {
            factor += rules.outsourced_adjustment;
        }
        if inputs.previous_major_ncs > 0 {
            factor += rules.previous_major_nc_adjustment;
        }

        factor.clamp(rules.factor_floor, rules.factor_ceiling)
    }

    pub fn validate(&self, inputs: &DurationInputs) -> DurationAssessment {
        let base = self.base_hours(inputs.employee_count);
        let mut required_minimum = base * self.complexity_factor(inputs);
        if !inputs.is_initial_certification {
            required_minimum *= self.rules.surveillance_multiplier;
        }

        let shortfall_hours = (required_minimum - inputs.planned_hours).max(0.0);
        let severity = if shortfall_hours == 0.0 {
            DurationSeverity::Compliant
        } else if shortfall_hours <= self.rules.warning_threshold_hours {
            DurationSeverity::Warning
        } else {
            DurationSeverity::Critical
        };

        let recommendation = match severity {
            DurationSeverity::Compliant => format!(
                "Planned duration of {:.1}h meets the required minimum of {:.1}h.",
                inputs.planned_hours, required_minimum,
            ),
            DurationSeverity::Warning => format!(
                "Planned duration of {:.1}h is {:.1}h short of the required {:.1}h; extend the on-site schedule or document the reduction rationale.",
                inputs.planned_hours, shortfall_hours, required_minimum,
            ),
            DurationSeverity::Critical => format!(
                "Planned duration of {:.1}h is {:.1}h short of the required {:.1}h; the audit plan must be re-issued before submission.",
                inputs.planned_hours, shortfall_hours, required_minimum,
            ),
        };

        DurationAssessment {
            is_valid: shortfall_hours == 0.0,
            required_minimum,
            shortfall_hours,
            severity,
            recommendation,
        }
    }
}

impl Default for DurationValidator {
    fn default() -> Self {
        Self::new(DurationRules::default())
    }
}
