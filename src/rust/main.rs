use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use disease_predictor::{
    serve_lines, ArtifactHashes, ArtifactManager, Predictor, PredictorError, RuntimeConfig,
    SymptomForm,
};
use log::{error, info};

const DISCLAIMER: &str =
    "This AI tool is for informational purposes only. Consult a doctor for medical advice.";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the model and label artifacts
    #[arg(long, env = "DISEASE_PREDICTOR_HOME")]
    artifacts_dir: Option<PathBuf>,

    /// Model artifact (.onnx or .json); overrides the artifacts directory
    #[arg(long, env = "DISEASE_PREDICTOR_MODEL")]
    model: Option<PathBuf>,

    /// Label table artifact (JSON array); overrides the artifacts directory
    #[arg(long, env = "DISEASE_PREDICTOR_LABELS")]
    labels: Option<PathBuf>,

    /// Expected SHA-256 of the model artifact
    #[arg(long)]
    model_sha256: Option<String>,

    /// Expected SHA-256 of the label artifact
    #[arg(long)]
    labels_sha256: Option<String>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Age in years
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(20..=70))]
    age: u32,

    /// Do you have a fever? (Yes/No)
    #[arg(long, default_value = "No")]
    fever: String,

    /// Do you have a cough? (Yes/No)
    #[arg(long, default_value = "No")]
    cough: String,

    /// Do you feel fatigued? (Yes/No)
    #[arg(long, default_value = "No")]
    fatigue: String,

    /// Gender (Male/Female)
    #[arg(long, default_value = "Male")]
    gender: String,

    /// Are you a smoker? (Yes/No)
    #[arg(long, default_value = "No")]
    smoker: String,

    /// Print the encoded symptom summary
    #[arg(long)]
    summary: bool,

    /// Read one JSON form per line from stdin and answer with one JSON line each
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let predictor = match load_predictor(&args) {
        Ok(predictor) => predictor,
        Err(e @ PredictorError::ArtifactsMissing { .. }) => {
            error!("{}", e);
            eprintln!("Model or label files are missing. Please provide them.");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Failed to load the predictor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = if args.json {
        serve_json(&predictor)
    } else {
        predict_once(&predictor, &args)
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_predictor(args: &Args) -> Result<Predictor, PredictorError> {
    let manager = match &args.artifacts_dir {
        Some(dir) => ArtifactManager::new(dir),
        None => ArtifactManager::new_default(),
    };
    let start_time = Instant::now();
    let hashes = ArtifactHashes {
        model: args.model_sha256.clone(),
        labels: args.labels_sha256.clone(),
    };
    let builder = Predictor::builder()
        .with_runtime_config(RuntimeConfig::default().with_threads(args.threads))
        .with_expected_hashes(hashes);

    let predictor = if args.model.is_none() && args.labels.is_none() {
        info!("Loading artifacts from {:?}", manager.artifacts_dir());
        builder.with_artifact_manager(&manager)?.build()?
    } else {
        let model_path = args.model.clone().unwrap_or_else(|| manager.get_model_path());
        let labels_path = args.labels.clone().unwrap_or_else(|| manager.get_labels_path());
        info!("Loading artifacts from {:?} and {:?}", model_path, labels_path);
        builder.with_artifacts(&model_path, &labels_path)?.build()?
    };

    info!("Predictor loaded (took {:.2?})", start_time.elapsed());
    Ok(predictor)
}

fn predict_once(predictor: &Predictor, args: &Args) -> anyhow::Result<ExitCode> {
    let form = SymptomForm {
        age: args.age,
        fever: args.fever.clone(),
        cough: args.cough.clone(),
        fatigue: args.fatigue.clone(),
        gender: args.gender.clone(),
        smoker: args.smoker.clone(),
    };

    info!("Analyzing symptoms: {:?}", form);
    match predictor.predict_form(&form) {
        Ok(prediction) => {
            println!("AI Suggests: {}", prediction.label);
            if args.summary {
                println!("\nSymptom Summary:");
                for (caption, value) in prediction.features.summary() {
                    println!("  {:<28}{}", caption, value);
                }
            }
            println!("\n{}", DISCLAIMER);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Prediction failed ({}): {}", e.kind(), e);
            eprintln!("Prediction failed. Please check input or model. {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn serve_json(predictor: &Predictor) -> anyhow::Result<ExitCode> {
    let answered = serve_lines(predictor, io::stdin().lock(), io::stdout().lock())
        .context("Failed to serve requests")?;
    info!("Answered {} requests", answered);
    Ok(ExitCode::SUCCESS)
}
