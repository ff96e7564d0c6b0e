//! Binary Classification command line interface
//!
//! Classifies the mushroom data set with an SVM, logistic regression or a
//! random forest, prints accuracy, precision and recall and writes the
//! requested diagnostic plots as SVG files.

use binclass::api::{ClassificationReport, Session};
use binclass::core::Result;
use binclass::model::{
    ClassifierConfig, ForestConfig, Gamma, Kernel, LogisticConfig, Parallelism, SvmConfig,
};
use binclass::plot::{MetricSelection, SvgRenderer};
use binclass::AppConfig;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process;

const TITLE: &str = "Binary Classification";
const TAGLINE: &str = "Are your mushrooms edible or poisonous? 🍄";

#[derive(Parser)]
#[command(name = "binclass")]
#[command(about = "Binary Classification: are your mushrooms edible or poisonous?")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mushroom CSV file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory for persisted dataset snapshots
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Keep cached tables in memory only
    #[arg(long, global = true)]
    no_persist: bool,

    /// Directory for rendered plots
    #[arg(long, global = true)]
    plot_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a classifier and report its test metrics
    Classify(ClassifyArgs),
    /// Show the encoded data set
    Data(DataArgs),
    /// Inspect or clear the dataset cache
    Cache(CacheArgs),
}

#[derive(Args)]
struct ClassifyArgs {
    #[command(subcommand)]
    classifier: ClassifierCommand,
}

#[derive(Subcommand)]
enum ClassifierCommand {
    /// Support Vector Machine (SVM)
    Svm {
        /// Regularization parameter C
        #[arg(short = 'C', long = "c", default_value = "0.01", value_parser = parse_c)]
        c: f64,
        #[arg(long, default_value = "rbf")]
        kernel: CliKernel,
        /// Kernel coefficient policy
        #[arg(long, default_value = "scale")]
        gamma: CliGamma,
        #[command(flatten)]
        metrics: MetricArgs,
    },
    /// Logistic Regression
    Logistic {
        /// Regularization parameter C
        #[arg(short = 'C', long = "c", default_value = "0.01", value_parser = parse_c)]
        c: f64,
        /// Maximum number of iterations
        #[arg(long, default_value = "100", value_parser = RangedU64ValueParser::<u64>::new().range(100..=500))]
        max_iter: u64,
        #[command(flatten)]
        metrics: MetricArgs,
    },
    /// Random Forest
    Forest {
        /// Number of trees in the forest
        #[arg(long, default_value = "100", value_parser = RangedU64ValueParser::<usize>::new().range(100..=5000))]
        n_estimators: usize,
        /// Maximum depth of each tree
        #[arg(long, default_value = "1", value_parser = RangedU64ValueParser::<usize>::new().range(1..=20))]
        max_depth: usize,
        /// Bootstrap samples when building trees
        #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
        bootstrap: bool,
        /// Worker threads; all cores when omitted
        #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        jobs: Option<usize>,
        /// Seed for bootstrap and feature sampling
        #[arg(long)]
        random_state: Option<u64>,
        #[command(flatten)]
        metrics: MetricArgs,
    },
}

#[derive(Args)]
struct MetricArgs {
    /// Plots to render: confusion-matrix, roc-curve, precision-recall-curve
    #[arg(long, value_parser = parse_metrics)]
    metrics: Option<MetricSelection>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    /// Radial basis function
    #[value(name = "rbf")]
    Rbf,
    #[value(name = "linear")]
    Linear,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliGamma {
    /// 1 / (n_features * var(X))
    #[value(name = "scale")]
    Scale,
    /// 1 / n_features
    #[value(name = "auto")]
    Auto,
}

impl From<CliKernel> for Kernel {
    fn from(kernel: CliKernel) -> Self {
        match kernel {
            CliKernel::Rbf => Kernel::Rbf,
            CliKernel::Linear => Kernel::Linear,
        }
    }
}

impl From<CliGamma> for Gamma {
    fn from(gamma: CliGamma) -> Self {
        match gamma {
            CliGamma::Scale => Gamma::Scale,
            CliGamma::Auto => Gamma::Auto,
        }
    }
}

#[derive(Args)]
struct DataArgs {
    /// Show only the first N rows
    #[arg(long)]
    head: Option<usize>,
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    operation: CacheOperation,
}

#[derive(Subcommand)]
enum CacheOperation {
    /// List persisted dataset snapshots
    Stats,
    /// Remove every persisted snapshot
    Clear,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = app_config(&cli).and_then(|config| match cli.command {
        Commands::Classify(args) => classify_command(args, config),
        Commands::Data(args) => data_command(args, config),
        Commands::Cache(args) => cache_command(args, config),
    });

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Config file (or defaults) with command line overrides applied
fn app_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if cli.no_persist {
        config.persist = false;
    }
    if let Some(dir) = &cli.plot_dir {
        config.plot_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn parse_c(s: &str) -> std::result::Result<f64, String> {
    let c: f64 = s.parse().map_err(|e| format!("invalid number '{s}': {e}"))?;
    if !(SvmConfig::C_MIN..=SvmConfig::C_MAX).contains(&c) {
        return Err(format!(
            "C must be within [{}, {}]",
            SvmConfig::C_MIN,
            SvmConfig::C_MAX
        ));
    }
    Ok(c)
}

fn parse_metrics(s: &str) -> Result<MetricSelection> {
    s.parse()
}

fn classify_command(args: ClassifyArgs, config: AppConfig) -> Result<()> {
    let (classifier, metrics) = match args.classifier {
        ClassifierCommand::Svm {
            c,
            kernel,
            gamma,
            metrics,
        } => (
            ClassifierConfig::from(SvmConfig::new(c, kernel.into(), gamma.into())),
            metrics,
        ),
        ClassifierCommand::Logistic {
            c,
            max_iter,
            metrics,
        } => (ClassifierConfig::from(LogisticConfig::new(c, max_iter)), metrics),
        ClassifierCommand::Forest {
            n_estimators,
            max_depth,
            bootstrap,
            jobs,
            random_state,
            metrics,
        } => {
            let mut forest = ForestConfig::new(n_estimators, max_depth, bootstrap)
                .with_parallelism(jobs.map_or(Parallelism::AllCores, Parallelism::Threads));
            if let Some(seed) = random_state {
                forest = forest.with_random_state(seed);
            }
            (ClassifierConfig::from(forest), metrics)
        }
    };
    let metrics = metrics.metrics.unwrap_or_default();

    info!("Classifying with {} ({})", classifier.family(), classifier);
    let renderer = SvgRenderer::new(&config.plot_dir);
    let mut session = Session::from_config(config);
    let report = session.classify(&classifier, &metrics, &renderer)?;

    print_report(&report);
    report.into_result().map(|_| ())
}

fn print_report(report: &ClassificationReport) {
    println!("{TITLE}");
    println!("{TAGLINE}");
    println!();
    println!("{} Results", report.family);
    let metrics = report.evaluation.metrics.rounded();
    println!("Accuracy: {:.2}", metrics.accuracy);
    println!("Precision: {:.2}", metrics.precision);
    println!("Recall: {:.2}", metrics.recall);

    for (plot, path) in &report.plots {
        println!();
        println!("{}", plot.title());
        println!("  {}", path.display());
    }
}

fn data_command(args: DataArgs, config: AppConfig) -> Result<()> {
    let mut session = Session::from_config(config);
    let dataset = session.dataset()?;

    println!("Mushroom Data Set for Classification");
    println!("{}", dataset.column_names().join(","));

    let n_rows = args.head.map_or(dataset.n_rows(), |n| n.min(dataset.n_rows()));
    for i in 0..n_rows {
        let row: Vec<String> = dataset.row(i).iter().map(u32::to_string).collect();
        println!("{}", row.join(","));
    }
    if n_rows < dataset.n_rows() {
        println!("... ({} more rows)", dataset.n_rows() - n_rows);
    }
    Ok(())
}

fn cache_command(args: CacheArgs, config: AppConfig) -> Result<()> {
    // snapshots left by earlier runs are inspected even under --no-persist
    let config = AppConfig {
        persist: true,
        ..config
    };
    let cache_dir = config.cache_dir.clone();
    let mut session = Session::from_config(config);

    match args.operation {
        CacheOperation::Stats => {
            let snapshots = session.snapshots()?;
            println!("Cache directory: {}", cache_dir.display());
            println!("Snapshots: {}", snapshots.len());
            for snapshot in &snapshots {
                println!();
                snapshot.print_summary();
            }
            Ok(())
        }
        CacheOperation::Clear => {
            let removed = session.clear_cache()?;
            println!("Removed {removed} snapshot(s) from {}", cache_dir.display());
            Ok(())
        }
    }
}
