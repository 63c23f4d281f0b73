//! Offline precision@k evaluation over the configured dataset.

use graphrec_api::{
    config::Config,
    engine::{evaluate, DatasetPaths},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "graphrec_api=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let (ratings, _) = DatasetPaths::from_dir(&config.data_dir).load()?;
    let report = evaluate(&ratings, config.eval_k, &config.random_walk())?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
