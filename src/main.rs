//! CropSight CLI
//!
//! Offline access to the same library the server uses: run a packaged model
//! on an image or a feature vector, query the knowledge base, and check
//! model and knowledge-base files before deploying them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cropsight::backend::backend_name;
use cropsight::inference::{encode_features, prepare, InferenceEngine, ModelRegistry, CROP_FEATURES};
use cropsight::knowledge::{resolve, KnowledgeDocument};
use cropsight::model::ModelInfo;
use cropsight::utils::logging::{init_logging, LogConfig};

/// Crop disease, pest and crop recommendation inference
#[derive(Parser, Debug)]
#[command(name = "cropsight")]
#[command(version)]
#[command(about = "Agricultural model inference and treatment recommendations", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a packaged model on an image or a feature vector
    Predict {
        /// Model directory containing model_info.json and model.mpk
        #[arg(short, long)]
        model_dir: PathBuf,

        /// Image to classify (image models)
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Feature value as NAME=VALUE, repeatable (tabular models)
        #[arg(short, long = "feature")]
        features: Vec<String>,

        /// Number of predictions to show
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },

    /// Look up treatment recommendations
    Recommend {
        /// Knowledge base JSON
        #[arg(long, env = "CROPSIGHT_KNOWLEDGE_BASE", default_value = "data/recommendations.json")]
        knowledge_base: PathBuf,

        /// Disease name
        #[arg(short, long)]
        disease: String,

        /// Crop name
        #[arg(short, long, default_value = "Rice")]
        crop: String,

        /// Region name
        #[arg(short, long, default_value = "General")]
        region: String,
    },

    /// Show the metadata of a packaged model
    Inspect {
        /// Model directory containing model_info.json
        #[arg(short, long)]
        model_dir: PathBuf,
    },

    /// Validate a knowledge base file and list its diseases
    CheckKb {
        /// Knowledge base JSON
        #[arg(long, env = "CROPSIGHT_KNOWLEDGE_BASE", default_value = "data/recommendations.json")]
        knowledge_base: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    println!();
    println!(
        "{}",
        format!("CropSight v{}", cropsight::VERSION).green().bold()
    );
    println!();

    match cli.command {
        Commands::Predict {
            model_dir,
            image,
            features,
            top_k,
        } => cmd_predict(&model_dir, image.as_deref(), &features, top_k)?,

        Commands::Recommend {
            knowledge_base,
            disease,
            crop,
            region,
        } => cmd_recommend(&knowledge_base, &disease, &crop, &region)?,

        Commands::Inspect { model_dir } => cmd_inspect(&model_dir)?,

        Commands::CheckKb { knowledge_base } => cmd_check_kb(&knowledge_base)?,
    }

    Ok(())
}

fn parse_features(pairs: &[String]) -> Result<HashMap<String, f64>> {
    let mut values = HashMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Feature '{}' is not NAME=VALUE", pair))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Feature '{}' has a non-numeric value", name))?;
        values.insert(name.trim().to_string(), value);
    }
    Ok(values)
}

/// Column order for a tabular model; models packaged without feature names
/// take the standard soil and weather readings
fn feature_order(declared: &[String]) -> Vec<&str> {
    if declared.is_empty() {
        CROP_FEATURES.to_vec()
    } else {
        declared.iter().map(String::as_str).collect()
    }
}

fn cmd_predict(model_dir: &Path, image: Option<&Path>, features: &[String], top_k: usize) -> Result<()> {
    println!("{}", "Prediction:".cyan().bold());
    println!("  Model:   {}", model_dir.display());
    println!("  Backend: {}", backend_name());
    println!();

    let info = ModelInfo::load(model_dir)?;
    let mut registry = ModelRegistry::new();
    let model = registry.load_dir("cli", model_dir)?;

    let tensor = if info.architecture.is_image() {
        let path = image.context("Image model expects --image")?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        prepare(&bytes, model.input_shape(), model.preprocessing()?)?
    } else {
        let names = feature_order(model.feature_names());
        if features.is_empty() {
            bail!("Tabular model expects --feature for: {}", names.join(", "));
        }
        encode_features(&names, &parse_features(features)?)?
    };

    let results = InferenceEngine::default().infer(&model, &tensor, top_k)?;
    info!("Ranked {} of {} classes", results.len(), model.labels().len());

    for r in &results {
        let line = format!("  #{} {:<32} {:.4}", r.rank, r.label, r.confidence);
        if r.rank == 1 {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    println!();
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    println!("  {}", title.yellow());
    if items.is_empty() {
        println!("    (none)");
    }
    for item in items {
        println!("    - {}", item);
    }
}

fn cmd_recommend(knowledge_base: &Path, disease: &str, crop: &str, region: &str) -> Result<()> {
    let doc = KnowledgeDocument::load(knowledge_base)?;
    let rec = resolve(&doc, disease, Some(crop), Some(region))?;

    println!("{}", format!("Recommendations for {}", rec.disease).cyan().bold());
    println!("  Crop:   {}", rec.crop);
    println!("  Region: {}", rec.region);
    if rec.crop != crop || rec.region != region {
        println!(
            "  {}",
            format!("(requested {} / {})", crop, region).dimmed()
        );
    }
    println!();
    if !rec.disease_info.is_empty() {
        println!("  {}", rec.disease_info);
        println!();
    }
    print_list("Preventative / cultural:", &rec.preventative_cultural);
    print_list("Organic / low cost:", &rec.organic_low_cost);
    print_list("Chemical control:", &rec.chemical_control);
    println!();
    Ok(())
}

fn cmd_inspect(model_dir: &Path) -> Result<()> {
    let info = ModelInfo::load(model_dir)?;

    println!("{}", "Model:".cyan().bold());
    println!("  Directory:     {}", model_dir.display());
    println!("  Architecture:  {}", info.architecture.name());
    println!("  Classes:       {}", info.class_names.len());
    match &info.input_shape {
        Some(shape) => println!("  Input shape:   {}", shape),
        None => println!("  Input shape:   (from architecture)"),
    }
    if let Some(mode) = info.normalization {
        println!("  Normalization: {}", mode);
    }
    println!("  Softmax head:  {}", info.softmax_output);
    if !info.feature_names.is_empty() {
        println!("  Features:      {}", info.feature_names.join(", "));
    }
    println!();
    for (i, name) in info.class_names.iter().enumerate() {
        println!("  {:>3}  {}", i, name);
    }
    println!();

    if !model_dir.join(cropsight::model::WEIGHTS_FILE).exists() {
        println!(
            "{} {} is missing",
            "Warning:".yellow(),
            cropsight::model::WEIGHTS_FILE
        );
    }
    Ok(())
}

fn cmd_check_kb(knowledge_base: &Path) -> Result<()> {
    let doc = KnowledgeDocument::load(knowledge_base)?;

    println!("{}", "Knowledge base:".cyan().bold());
    println!("  File:     {}", knowledge_base.display());
    println!("  Diseases: {}", doc.len());
    for disease in doc.diseases() {
        let crops: Vec<&str> = doc
            .disease(disease)
            .map(|c| c.keys().collect())
            .unwrap_or_default();
        println!("    {:<24} {}", disease, crops.join(", "));
    }
    println!();

    if doc.warnings().is_empty() {
        println!("{}", "No problems found".green());
    } else {
        println!("{}", format!("{} warning(s):", doc.warnings().len()).yellow().bold());
        for w in doc.warnings() {
            println!("  - {}", w);
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_falls_back_to_crop_readings() {
        assert_eq!(feature_order(&[]), CROP_FEATURES.to_vec());

        let declared = vec!["rainfall".to_string(), "ph".to_string()];
        assert_eq!(feature_order(&declared), vec!["rainfall", "ph"]);
    }

    #[test]
    fn test_parse_features() {
        let values = parse_features(&["N=90".to_string(), " ph = 6.5".to_string()]).unwrap();
        assert_eq!(values["N"], 90.0);
        assert_eq!(values["ph"], 6.5);

        assert!(parse_features(&["N".to_string()]).is_err());
        assert!(parse_features(&["N=lots".to_string()]).is_err());
    }
}
