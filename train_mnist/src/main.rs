use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use training::{Trainer, TrainingConfig};

/// Trains a feed-forward classifier on MNIST-in-CSV data.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Training set CSV (label,pixel0,...,pixel783 per row)
    train_data: PathBuf,
    /// Held-out test set CSV in the same format
    test_data: PathBuf,
    /// JSON training configuration; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for the learned weight and bias files
    #[arg(long, default_value = "model")]
    output: PathBuf,
    /// Seed override for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    println!("Loading training data from {}...", args.train_data.display());
    let train = mnist::load_csv(&args.train_data)?;
    println!("Loading test data from {}...", args.test_data.display());
    let test = mnist::load_csv(&args.test_data)?;
    println!(
        "Loaded {} training and {} test examples",
        train.len(),
        test.len()
    );

    println!(
        "\nTraining a {:?} network for {} epochs (batch size {})",
        config.layer_sizes(),
        config.epochs,
        config.batch_size
    );
    let mut trainer = Trainer::new(config);
    trainer.train(&train, &test)?;
    trainer.history().print_summary();

    trainer.save_network(&args.output)?;
    println!("\nNetwork saved to {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_end_to_end() -> Result<()> {
        // Two single-pixel examples, one per class.
        let dir = tempfile::tempdir()?;
        let csv_path = dir.path().join("tiny.csv");
        let mut file = std::fs::File::create(&csv_path)?;
        for label in 0..2 {
            let mut pixels = vec!["0"; 784];
            pixels[label] = "255";
            writeln!(file, "{},{}", label, pixels.join(","))?;
        }

        let data = mnist::load_csv(&csv_path)?;
        let config = TrainingConfig {
            batch_size: 2,
            epochs: 1,
            learning_rate: 0.1,
            lambda: 0.0,
            hidden_layers: vec![4],
            seed: Some(1),
        };

        let mut trainer = Trainer::new(config);
        trainer.train(&data, &data)?;
        assert_eq!(trainer.history().accuracies.len(), 1);

        let model_dir = dir.path().join("model");
        trainer.save_network(&model_dir)?;
        assert!(model_dir.join("weights0.txt").exists());
        assert!(model_dir.join("biases1.txt").exists());

        Ok(())
    }
}
