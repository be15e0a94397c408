use anyhow::Result;
use clap::{Parser, Subcommand};

use certflow::compliance::{
    DurationInputs, DurationValidator, ProcessComplexity, RegulatoryEnvironment, SamplingInputs,
    SamplingPlanner, ScopeVariation,
};
use certflow::config;

#[derive(Parser)]
#[command(name = "certflow")]
#[command(about = "Certification audit workflow engine and compliance calculators")]
#[command(long_about = "Certflow governs the audit lifecycle of a certification body. This \
                        binary exposes the stateless compliance calculators; the stateful \
                        workflow operations are a library API consumed by the record-keeping \
                        layer.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the minimum multi-site sample size (IAF MD1)
    SamplingPlan {
        /// Total number of sites in the certification scope
        #[arg(long)]
        total_sites: u32,
        /// Number of sites classified as high risk
        #[arg(long, default_value = "0")]
        high_risk_sites: u32,
        /// Findings recorded against the organization in the previous cycle
        #[arg(long, default_value = "0")]
        previous_findings: u32,
        /// Treat the audit as surveillance instead of initial certification
        #[arg(long)]
        surveillance: bool,
        /// Scope variation across sites
        #[arg(long, value_enum, default_value = "none")]
        scope_variation: ScopeVariation,
    },
    /// Check planned audit duration against the required minimum (IAF MD5)
    DurationCheck {
        /// Planned on-site hours
        #[arg(long)]
        planned_hours: f64,
        /// Effective employee count of the organization
        #[arg(long)]
        employees: u32,
        /// Treat the audit as surveillance instead of initial certification
        #[arg(long)]
        surveillance: bool,
        /// Number of sites in scope
        #[arg(long, default_value = "1")]
        sites: u32,
        /// Process complexity of the organization
        #[arg(long, value_enum, default_value = "standard")]
        process_complexity: ProcessComplexity,
        /// Scope variation across sites
        #[arg(long, value_enum, default_value = "none")]
        scope_variation: ScopeVariation,
        /// Regulatory environment of the sector
        #[arg(long, value_enum, default_value = "standard")]
        regulatory: RegulatoryEnvironment,
        /// Outsourced processes are part of the certification scope
        #[arg(long)]
        outsourced: bool,
        /// Major nonconformities raised in the previous cycle
        #[arg(long, default_value = "0")]
        previous_major_ncs: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    certflow::init_telemetry()?;
    certflow::init_config()?;
    let config = config()?;

    match cli.command {
        Commands::SamplingPlan {
            total_sites,
            high_risk_sites,
            previous_findings,
            surveillance,
            scope_variation,
        } => {
            let planner = SamplingPlanner::new(config.compliance.sampling.clone());
            let plan = planner.calculate(&SamplingInputs {
                total_sites,
                high_risk_sites,
                previous_findings_count: previous_findings,
                is_initial_certification: !surveillance,
                scope_variation,
            });
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::DurationCheck {
            planned_hours,
            employees,
            surveillance,
            sites,
            process_complexity,
            scope_variation,
            regulatory,
            outsourced,
            previous_major_ncs,
        } => {
            let validator = DurationValidator::new(config.compliance.duration.clone());
            let assessment = validator.validate(&DurationInputs {
                planned_hours,
                employee_count: employees,
                is_initial_certification: !surveillance,
                number_of_sites: sites,
                process_complexity,
                scope_variation,
                regulatory_environment: regulatory,
                outsourced_processes: outsourced,
                previous_major_ncs,
            });
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
    }

    Ok(())
}
