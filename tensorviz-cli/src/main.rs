//! TensorViz - rank-3 tensor transform simulator
//! Command-line interface for running and rendering simulations

mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tensorviz_core::{Shape, create_tensor, create_tensor_with_rng};
use tensorviz_orchestration::{
    OperationKind, RunSummary, Scheduler, SimEvent, SimulationConfig, SimulationObserver,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tensorviz")]
#[command(author = "TensorViz Contributors")]
#[command(version = "2026.1.16")]
#[command(about = "TensorViz - watch simple transforms reshape a 3D tensor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and render every step
    Run {
        /// Config file (defaults to ./tensorviz.toml when present)
        #[arg(short, long, value_name = "FILE", env = "TENSORVIZ_CONFIG")]
        config: Option<PathBuf>,

        /// Tensor shape as depth,rows,cols (e.g. 10,10,3)
        #[arg(short, long, env = "TENSORVIZ_SHAPE")]
        shape: Option<Shape>,

        /// Operation sequence, repeated cyclically (e.g. sine,tanh)
        #[arg(short, long, value_delimiter = ',', env = "TENSORVIZ_OPERATIONS")]
        operations: Vec<String>,

        /// Number of steps (1-1000)
        #[arg(short = 'n', long, env = "TENSORVIZ_STEPS")]
        steps: Option<usize>,

        /// Pause between steps in milliseconds (0 disables pacing)
        #[arg(long, value_name = "MS", env = "TENSORVIZ_STEP_DELAY_MS")]
        delay_ms: Option<u64>,

        /// Seed for a reproducible initial tensor
        #[arg(long, env = "TENSORVIZ_SEED")]
        seed: Option<u64>,

        /// Exponent used by matrix_power
        #[arg(long)]
        exponent: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
        format: OutputFormat,

        /// Only print progress lines, not tensors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Create one random tensor and print it
    Create {
        /// Tensor shape as depth,rows,cols
        #[arg(short, long, default_value = "10,10,3")]
        shape: Shape,

        /// Seed for a reproducible tensor
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Config file (defaults to ./tensorviz.toml when present)
        #[arg(short, long, value_name = "FILE", env = "TENSORVIZ_CONFIG")]
        config: Option<PathBuf>,
    },

    /// List available operations
    Ops,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Colored blocks and progress lines
    Terminal,
    /// One JSON object per event
    Json,
}

/// Overrides given on the command line
#[derive(Debug, Default)]
struct RunOverrides {
    shape: Option<Shape>,
    operations: Vec<String>,
    steps: Option<usize>,
    delay_ms: Option<u64>,
    seed: Option<u64>,
    exponent: Option<f64>,
}

impl RunOverrides {
    fn apply(self, config: &mut SimulationConfig) {
        if let Some(shape) = self.shape {
            config.shape = shape.dims().iter().map(|&d| d as i64).collect();
        }
        if !self.operations.is_empty() {
            config.operations = self.operations;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.step_delay_ms = delay_ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(exponent) = self.exponent {
            config.matrix_power.exponent = exponent;
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tensorviz=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            shape,
            operations,
            steps,
            delay_ms,
            seed,
            exponent,
            format,
            quiet,
        } => {
            let overrides = RunOverrides {
                shape,
                operations,
                steps,
                delay_ms,
                seed,
                exponent,
            };
            run_command(config.as_deref(), overrides, format, quiet)
        }
        Commands::Create { shape, seed, format } => create_command(shape, seed, format),
        Commands::Config { config } => config_command(config.as_deref()),
        Commands::Ops => {
            print_ops();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

// ============================================================================
// Simulation
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let config = SimulationConfig::load_or_default(path).with_context(|| match path {
        Some(path) => format!("could not load {}", path.display()),
        None => "could not load tensorviz.toml".to_string(),
    })?;
    Ok(config)
}

fn run_command(
    config_path: Option<&Path>,
    overrides: RunOverrides,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);

    let (request, registry) = config.validate()?;
    let mut driver = config.driver(registry);
    let mut scheduler = Scheduler::new(config.scheduler_config());

    if format == OutputFormat::Terminal {
        println!(
            "{} {} tensor, operations {}, {} steps",
            "Simulating".green().bold(),
            request.shape.to_string().cyan(),
            request.sequence.to_string().cyan(),
            request.total_steps
        );
        if !quiet {
            println!("{}", render::render_legend());
        }
    }

    let mut observer = CliObserver { format, quiet };
    let summary = driver.run(request, &mut observer, &mut scheduler)?;

    if format == OutputFormat::Terminal {
        print_summary(&summary);
    }

    Ok(())
}

/// Prints driver events to stdout
struct CliObserver {
    format: OutputFormat,
    quiet: bool,
}

impl CliObserver {
    fn print_terminal(&self, event: &SimEvent<'_>) {
        match event {
            SimEvent::Started { tensor, .. } => {
                if !self.quiet {
                    println!("\n{}", "Initial tensor".bold());
                    print!("{}", render::render_tensor(tensor));
                }
            }
            SimEvent::Step {
                step,
                total_steps,
                applied,
                tensor,
                ..
            } => {
                let name = if applied.is_failure() {
                    applied.name().red().bold()
                } else {
                    applied.name().cyan()
                };
                println!("\n{}/{}: Applied {}", format!("Step {}", step).bold(), total_steps, name);
                if !self.quiet {
                    print!("{}", render::render_tensor(tensor));
                }
            }
            SimEvent::StepFailed {
                step,
                operation,
                error,
                ..
            } => {
                println!(
                    "{} step {} could not apply {}: {}",
                    "warning:".yellow().bold(),
                    step,
                    operation,
                    error
                );
            }
            SimEvent::Completed { explanation, .. } => {
                println!("\n{} {}", "Explanation:".bold(), explanation.italic());
            }
        }
    }

    fn print_json(&self, event: &SimEvent<'_>) -> serde_json::Result<()> {
        let mut value = serde_json::to_value(event.record())?;
        if let (false, Some((tensor, _))) = (self.quiet, event.tensor()) {
            value["tensor"] = serde_json::to_value(tensor.to_nested())?;
        }
        println!("{}", serde_json::to_string(&value)?);
        Ok(())
    }
}

impl SimulationObserver for CliObserver {
    fn on_event(&mut self, event: &SimEvent<'_>) {
        match self.format {
            OutputFormat::Terminal => self.print_terminal(event),
            OutputFormat::Json => {
                if let Err(err) = self.print_json(event) {
                    tracing::error!(error = %err, "could not encode event");
                }
            }
        }
    }
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.statistics;
    println!();
    println!(
        "{} {} in {} steps ({} failed)",
        "Finished".green().bold(),
        summary.run.to_string().cyan(),
        summary.total_steps,
        summary.failures
    );
    println!("  shape:    {}", summary.final_shape);
    println!(
        "  values:   min {:.4}  max {:.4}  mean {:.4}  std {:.4}",
        stats.min, stats.max, stats.mean, stats.std_dev
    );
    if let Some(scheduler) = &summary.scheduler {
        println!(
            "  timing:   avg {:?}  max {:?} per step",
            scheduler.avg_execution_time, scheduler.max_execution_time
        );
    }
}

// ============================================================================
// Other commands
// ============================================================================

fn create_command(shape: Shape, seed: Option<u64>, format: OutputFormat) -> Result<()> {
    let tensor = match seed {
        Some(seed) => create_tensor_with_rng(shape, &mut StdRng::seed_from_u64(seed)),
        None => create_tensor(shape),
    };

    match format {
        OutputFormat::Terminal => {
            println!("{} {} tensor", "Created".green().bold(), shape.to_string().cyan());
            println!("{}", render::render_legend());
            print!("{}", render::render_tensor(&tensor));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&tensor)?);
        }
    }

    Ok(())
}

fn config_command(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate().context("configuration is invalid")?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn print_ops() {
    println!("{}", "Operations:".bold());
    for op in OperationKind::ALL {
        println!("  {:<14} {}", op.name().cyan(), op.explanation());
    }
    println!();
    println!("{}", "Examples:".bold());
    println!("  tensorviz run -s 10,10,3 -o sine,tanh -n 50   # Alternate sine and tanh");
    println!("  tensorviz run -o conv -n 3 --delay-ms 0       # Shrink with the Laplacian");
    println!("  tensorviz run -o matrix_power --exponent 3    # Cube every plane");
    println!("  tensorviz run --format json -q                # JSON lines without tensors");
    println!("  tensorviz create -s 2,4,4 --seed 7            # Print one random tensor");
}
