//! Simple SDK Example
//!
//! Trains a custom model and promotes it to a hosted Sync model.
//!
//! # Usage
//!
//! ```bash
//! export MLOPS_CODEX_LOGIN=ds@acme.io
//! export MLOPS_CODEX_PASSWORD=...
//! export MLOPS_CODEX_TENANT=acme
//! cargo run --example simple -- ./samples
//! ```
//!
//! The samples directory must hold `app.py`, `requirements.txt`,
//! `train.csv` and `schema.json`.

use mlops_codex_sdk::{
    CustomTraining, ExecutionStatus, MlopsCodexClient, OperationKind, PromoteRequest,
    RegistrationMode, TrainingRun,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let samples = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));

    println!("MLOps Codex SDK - Simple Example");
    println!("================================\n");

    // 1. Connect (login happens on the first call)
    let client = MlopsCodexClient::from_env()?;
    client.authenticate().await?;
    println!("1. Logged in to {}\n", client.config().base_url);

    // 2. Make sure the group exists
    let admin = client.admin();
    if admin.ensure_group_exists("teama").await.is_err() {
        let token = admin.create_group("teamA", "Example group").await?;
        println!("2. Group created, token: {token}\n");
    } else {
        println!("2. Group 'teama' already exists\n");
    }

    // 3. Experiment
    let training = client.training();
    let experiment = training
        .setup_experiment(
            "churn",
            "Classification",
            "teama",
            RegistrationMode::ReuseExisting,
        )
        .await?;
    println!("3. Experiment {}\n", experiment.training_hash);

    // 4. Run and wait
    let run = TrainingRun::Custom(CustomTraining {
        run_name: "first".into(),
        training_reference: "train_model".into(),
        python_version: "3.9".into(),
        input_data: samples.join("train.csv").to_string_lossy().into_owned(),
        source: samples.join("app.py"),
        requirements: samples.join("requirements.txt"),
        ..Default::default()
    });
    let execution = training
        .run(&experiment, &run, Some(&client.poll_options()))
        .await?;
    println!(
        "4. Execution {} finished: {}\n",
        execution.execution_id, execution.status
    );
    if execution.status != ExecutionStatus::Succeeded {
        return Ok(());
    }

    // 5. Promote and host
    let mut request = PromoteRequest::new(
        "churn-model",
        "score",
        samples.join("app.py"),
        OperationKind::Sync,
    )
    .with_schema(samples.join("schema.json"));
    request.requirements = Some(samples.join("requirements.txt"));
    request.wait_complete = true;

    let model = training
        .promote(&execution, &request, &client.poll_options())
        .await?;
    println!("5. Model {} is hosted", model.model_hash);

    Ok(())
}
