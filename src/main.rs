//! Headless driver for the classifier workbench.
//!
//! Trains the numeric engine for a fixed number of frames, optionally runs
//! the image engine over a sample directory, and writes the boundary view.

use std::path::PathBuf;
use std::sync::Arc;

use learnonauts_lab::config::{self, LabSettings};
use learnonauts_lab::dataset::{DatasetKind, ImportOutcome};
use learnonauts_lab::logging;
use learnonauts_lab::training::HostScheduler;
use learnonauts_lab::vision::{DirectorySource, SampleManifest};
use learnonauts_lab::workbench::{Mode, Workbench};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DatasetArg {
    Builtin(DatasetKind),
    Csv(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    dataset: DatasetArg,
    frames: u32,
    learning_rate: Option<f64>,
    seed: Option<u64>,
    out: Option<PathBuf>,
    images: Option<PathBuf>,
    config: Option<PathBuf>,
    save_model: Option<PathBuf>,
    load_model: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = load_settings(options.config.as_ref())?;
    if let Some(seed) = options.seed {
        settings.training.seed = Some(seed);
    }

    let scheduler = Arc::new(HostScheduler::new());
    let sample_root = options.images.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut workbench = Workbench::new(
        settings,
        scheduler.clone(),
        DirectorySource::new(&sample_root),
    );
    if let Some(rate) = options.learning_rate {
        workbench.set_learning_rate(rate);
    }
    match &options.dataset {
        DatasetArg::Builtin(kind) => workbench.set_dataset_kind(*kind),
        DatasetArg::Csv(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| format!("Failed to read CSV {}: {err}", path.display()))?;
            match workbench.import_csv(&text) {
                ImportOutcome::Imported { points, skipped } => {
                    println!("csv: {} points accepted, {skipped} rows skipped", points.len());
                }
                ImportOutcome::Empty { skipped } => {
                    return Err(format!(
                        "CSV {} has no usable rows ({skipped} skipped)",
                        path.display()
                    ));
                }
            }
        }
    }
    if let Some(path) = &options.load_model {
        let snapshot = workbench.load_model(path).map_err(|err| err.to_string())?;
        println!("loaded model at epoch {}", snapshot.epoch);
    }

    workbench.start_training();
    for _ in 0..options.frames {
        scheduler.run_frame();
    }
    workbench.pause_training();
    let metrics = workbench.engine().metrics();
    println!(
        "epoch {}  loss {:.4}  accuracy {:.1}%",
        metrics.epoch,
        metrics.loss,
        metrics.accuracy * 100.0
    );

    if let Some(path) = &options.save_model {
        workbench.save_model(path).map_err(|err| err.to_string())?;
        println!("saved model to {}", path.display());
    }
    if let Some(path) = &options.out {
        workbench.export_png(path).map_err(|err| err.to_string())?;
        println!("wrote {}", path.display());
    }

    if options.images.is_some() {
        workbench.set_mode(Mode::Image);
        let manifest = SampleManifest::load_or_fallback(&sample_root);
        workbench.load_samples(&manifest);
        let failures = workbench.images().prefetch_features(4);
        let summary = workbench.classify_images();
        println!(
            "images: {} classified, {} unclassifiable, {} labeled examples, {failures} failed loads",
            summary.classified, summary.unclassifiable, summary.examples
        );
        for image in workbench.images().images() {
            if let Some(verdict) = image.prediction() {
                println!(
                    "  {}  class {}  confidence {:.2}",
                    image.url,
                    verdict.label.index(),
                    verdict.confidence
                );
            }
        }
    }

    match workbench.complete() {
        Some(score) => println!("completion score: {score}"),
        None => println!("completion already reported"),
    }
    Ok(())
}

fn load_settings(path: Option<&PathBuf>) -> Result<LabSettings, String> {
    match path {
        Some(path) => config::load_settings_from(path).map_err(|err| err.to_string()),
        None => config::load_or_default().or_else(|err| {
            tracing::warn!("Using default settings: {err}");
            Ok(LabSettings::default())
        }),
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        dataset: DatasetArg::Builtin(DatasetKind::Ocean),
        frames: 60,
        learning_rate: None,
        seed: None,
        out: None,
        images: None,
        config: None,
        save_model: None,
        load_model: None,
    };

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let mut value = || {
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--dataset" => {
                let kind = value()?;
                options.dataset = if kind.eq_ignore_ascii_case("csv") {
                    DatasetArg::Csv(PathBuf::from(value()?))
                } else {
                    DatasetKind::parse(&kind)
                        .filter(|kind| *kind != DatasetKind::Csv)
                        .map(DatasetArg::Builtin)
                        .ok_or_else(|| format!("Unknown dataset: {kind}"))?
                };
            }
            "--frames" => {
                let raw = value()?;
                options.frames = raw
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid --frames value: {raw}"))?;
            }
            "--lr" => {
                let raw = value()?;
                let rate = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|rate| rate.is_finite() && *rate > 0.0)
                    .ok_or_else(|| format!("Invalid --lr value: {raw}"))?;
                options.learning_rate = Some(rate);
            }
            "--seed" => {
                let raw = value()?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {raw}"))?;
                options.seed = Some(seed);
            }
            "--out" => options.out = Some(PathBuf::from(value()?)),
            "--images" => options.images = Some(PathBuf::from(value()?)),
            "--config" => options.config = Some(PathBuf::from(value()?)),
            "--save-model" => options.save_model = Some(PathBuf::from(value()?)),
            "--load-model" => options.load_model = Some(PathBuf::from(value()?)),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "learnonauts-lab",
        "",
        "Trains the two-feature logistic regression workbench without a UI.",
        "",
        "Usage:",
        "  learnonauts-lab [--dataset <ocean|fruit-veg|draw|csv PATH>] [options]",
        "",
        "Options:",
        "  --dataset <kind>       Built-in dataset or `csv <file>` (default: ocean).",
        "  --frames <n>           Animation frames to train (default: 60).",
        "  --lr <f64>             Learning rate (default: from config, 0.3).",
        "  --seed <u64>           RNG seed for datasets, resets and splits.",
        "  --out <file.png>       Write the boundary view as PNG.",
        "  --images <dir>         Classify samples listed in <dir>/manifest.json.",
        "  --config <file.toml>   Settings file (default: app config directory).",
        "  --save-model <file>    Save the trained model as JSON.",
        "  --load-model <file>    Start from a saved model.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn defaults_train_the_ocean_dataset() {
        let options = parse_args(Vec::new()).unwrap();
        assert_eq!(options.dataset, DatasetArg::Builtin(DatasetKind::Ocean));
        assert_eq!(options.frames, 60);
        assert_eq!(options.learning_rate, None);
    }

    #[test]
    fn csv_dataset_takes_a_path() {
        let options = parse_args(args(&["--dataset", "csv", "points.csv", "--frames", "5"])).unwrap();
        assert_eq!(options.dataset, DatasetArg::Csv(PathBuf::from("points.csv")));
        assert_eq!(options.frames, 5);
    }

    #[test]
    fn builtin_names_accept_dashes() {
        let options = parse_args(args(&["--dataset", "fruit-veg", "--lr", "0.5"])).unwrap();
        assert_eq!(options.dataset, DatasetArg::Builtin(DatasetKind::FruitVeg));
        assert_eq!(options.learning_rate, Some(0.5));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse_args(args(&["--lr", "-1"])).is_err());
        assert!(parse_args(args(&["--frames"])).is_err());
        assert!(parse_args(args(&["--dataset", "mars"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }
}
