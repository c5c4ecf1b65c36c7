use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use phishshield::features::{FeatureExtractor, FeatureSchema};
use phishshield::{
    ArtifactInfo, ModelManager, OnnxClassifier, RuntimeConfig, Scorer, ServiceConfig,
};

#[derive(Parser)]
#[command(author, version, about = "Score URLs for phishing risk with a trained classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP scoring service
    Serve {
        #[command(flatten)]
        model: ModelArgs,

        /// Address to bind to (overrides PHISH_BIND)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Score a single URL and print the report
    Score {
        /// The URL to score
        url: String,

        #[command(flatten)]
        model: ModelArgs,

        /// Output format: json or summary
        #[arg(long, default_value = "summary")]
        format: String,
    },

    /// Print the features extracted from a URL (no model needed)
    Features {
        /// The URL to inspect
        url: String,

        /// Optional feature schema to also print the aligned vector
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Download and verify an artifact set described by a JSON manifest
    Fetch {
        /// Path to the artifact manifest
        manifest: PathBuf,

        /// Force a fresh download of the artifact files
        #[arg(short, long)]
        fresh: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// ONNX model file (overrides PHISH_MODEL)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Feature schema JSON (overrides PHISH_FEATURES)
    #[arg(long)]
    features: Option<PathBuf>,

    /// Class labels JSON (overrides PHISH_LABELS)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Use a downloaded artifact set from the model cache instead of file paths
    #[arg(long, conflicts_with_all = ["model", "features", "labels"])]
    artifacts: Option<String>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 1)]
    threads: usize,
}

impl ModelArgs {
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut config = ServiceConfig::from_env();
        if let Some(name) = &self.artifacts {
            let manager = ModelManager::new_default()?;
            let paths = manager.downloaded_paths(name)?;
            config.model_path = paths.model;
            config.features_path = paths.schema;
            config.labels_path = paths.labels;
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(features) = &self.features {
            config.features_path = features.clone();
        }
        if let Some(labels) = &self.labels {
            config.labels_path = labels.clone();
        }
        Ok(config)
    }

    fn load_scorer(&self, config: &ServiceConfig) -> Result<Scorer> {
        let start_time = Instant::now();
        let runtime = RuntimeConfig {
            intra_threads: self.threads,
            ..RuntimeConfig::default()
        };
        let classifier: OnnxClassifier = config
            .build_classifier(runtime)
            .with_context(|| format!("Failed to load model {:?}", config.model_path))?;

        let info = classifier.info();
        info!(
            "Classifier loaded in {:.2?}: {} features, classes {:?}, output '{}'",
            start_time.elapsed(),
            info.num_features,
            info.class_labels,
            info.probability_output
        );

        let schema = Arc::new(classifier.schema().clone());
        Ok(Scorer::new(Arc::new(classifier), schema))
    }
}

fn cmd_serve(model: ModelArgs, bind: Option<String>) -> Result<()> {
    let mut config = model.service_config()?;
    if let Some(bind) = bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", bind))?;
    }

    let scorer = model.load_scorer(&config)?;
    info!("Starting PhishShield scoring service on {}", config.bind_addr);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(phishshield::server::run_server(config.bind_addr, scorer))?;
    Ok(())
}

fn cmd_score(url: String, model: ModelArgs, format: String) -> Result<()> {
    let config = model.service_config()?;
    let scorer = model.load_scorer(&config)?;
    let report = scorer.score(&url)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("URL Risk Report");
            println!("===============");
            println!("URL:        {}", report.url);
            println!("Label:      {}", report.predicted_label);
            println!("Phishing:   {}%", report.phishing_score);
            println!("Legitimate: {}%", report.legitimate_score);
            println!("Rating:     {}", report.rating_color);
            println!("Advice:     {}", report.advice);
        }
    }
    Ok(())
}

fn cmd_features(url: String, schema: Option<PathBuf>) -> Result<()> {
    let features = FeatureExtractor::default().extract(&url);
    println!("{}", serde_json::to_string_pretty(&features)?);

    if let Some(path) = schema {
        let schema = FeatureSchema::from_file(&path)
            .with_context(|| format!("Failed to load schema {:?}", path))?;
        println!("{}", serde_json::to_string(&schema.align(&features))?);
    }
    Ok(())
}

async fn cmd_fetch(manifest: PathBuf, fresh: bool) -> Result<()> {
    let content = fs::read_to_string(&manifest)
        .with_context(|| format!("Failed to read manifest {:?}", manifest))?;
    let info: ArtifactInfo = serde_json::from_str(&content)
        .with_context(|| format!("Invalid artifact manifest {:?}", manifest))?;

    let manager = ModelManager::new_default()?;
    if fresh {
        info!("Fresh download requested - removing any existing artifact files...");
        manager.remove_download(&info.name)?;
    }
    manager.ensure_model_downloaded(&info).await?;

    println!("Artifacts '{}' ready in {:?}", info.name, manager.models_dir().join(&info.name));
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { model, bind } => cmd_serve(model, bind),
        Commands::Score { url, model, format } => cmd_score(url, model, format),
        Commands::Features { url, schema } => cmd_features(url, schema),
        Commands::Fetch { manifest, fresh } => tokio::runtime::Runtime::new()
            .map_err(anyhow::Error::from)
            .and_then(|rt| rt.block_on(cmd_fetch(manifest, fresh))),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
