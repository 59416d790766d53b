//! MLOps Codex CLI - groups, trainings, promotion and preprocessing from the shell

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use mlops_codex_sdk::{
    cancel_channel, AutoMlTraining, ClientConfig, Credentials, CustomTraining, ExecutionStatus,
    Experiment, ExperimentQuery, ExternalTraining, FileOrHash, MlopsCodexClient, ModelHandle,
    ModelState, ModelType, OperationKind, PollOptions, PreprocessingHandle, PreprocessingScript,
    PromoteRequest, RegistrationMode, TerminalStatus, TrainingRun,
};
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "mlops_codex=info";

#[derive(Parser)]
#[command(name = "mlops-codex")]
#[command(about = "MLOps Codex platform CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Platform API URL (overrides config files)
    #[arg(long, env = "MLOPS_CODEX_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Extra TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "MLOPS_CODEX_LOGIN", global = true)]
    login: Option<String>,

    #[arg(long, env = "MLOPS_CODEX_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[arg(long, env = "MLOPS_CODEX_TENANT", global = true)]
    tenant: Option<String>,

    /// Stop waiting after this many seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage groups
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Register or find training experiments
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommands,
    },

    /// Upload, trigger and follow training executions
    Train {
        #[command(subcommand)]
        command: TrainCommands,
    },

    /// Promote a succeeded execution to a hosted model
    Promote(PromoteArgs),

    /// Follow hosted models
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    /// Register, host and run preprocessing scripts
    Preprocessing {
        #[command(subcommand)]
        command: PreprocessingCommands,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List groups visible to the user
    List,

    /// Create a group (its token is shown once)
    Create {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Refresh a group token
    Refresh {
        name: String,

        /// Issue a new token even if the current one is still valid
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ExperimentCommands {
    /// Reuse or register an experiment
    Setup {
        #[arg(long)]
        name: String,

        /// Classification, Regression or Unsupervised
        #[arg(long)]
        model_type: String,

        #[arg(long)]
        group: String,

        /// Register a new experiment even if one matches
        #[arg(long)]
        force: bool,
    },

    /// Search registered experiments
    Search {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        group: Option<String>,

        #[arg(long)]
        model_type: Option<String>,
    },
}

#[derive(Args)]
struct ExperimentRef {
    #[arg(long)]
    group: String,

    #[arg(long)]
    training_hash: String,
}

#[derive(Subcommand)]
enum TrainCommands {
    /// Run a user-provided training script
    Custom(CustomArgs),

    /// Run an AutoML search
    Automl(AutoMlArgs),

    /// Import a model trained outside the platform
    External(ExternalArgs),

    /// Show (or wait for) an execution status
    Status {
        #[command(flatten)]
        experiment: ExperimentRef,

        #[arg(long)]
        execution_id: u64,

        #[arg(long)]
        wait: bool,
    },
}

#[derive(Args)]
struct CustomArgs {
    #[command(flatten)]
    experiment: ExperimentRef,

    #[arg(long)]
    run_name: String,

    #[arg(long)]
    description: Option<String>,

    /// Training script (.py or .ipynb)
    #[arg(long)]
    source: PathBuf,

    /// requirements.txt
    #[arg(long)]
    requirements: PathBuf,

    /// Entrypoint function inside the script
    #[arg(long)]
    reference: String,

    #[arg(long, default_value = "3.9")]
    python: String,

    /// Local file or dataset hash
    #[arg(long)]
    input: String,

    #[arg(long)]
    env: Option<PathBuf>,

    #[arg(long = "extra")]
    extras: Vec<PathBuf>,

    #[arg(long)]
    wait: bool,
}

#[derive(Args)]
struct AutoMlArgs {
    #[command(flatten)]
    experiment: ExperimentRef,

    #[arg(long)]
    run_name: String,

    #[arg(long)]
    description: Option<String>,

    /// JSON search configuration
    #[arg(long)]
    conf: PathBuf,

    /// Local file or dataset hash
    #[arg(long)]
    input: String,

    #[arg(long)]
    wait: bool,
}

/// Each of features, target and output takes a file or a dataset hash
#[derive(Args)]
struct ExternalArgs {
    #[command(flatten)]
    experiment: ExperimentRef,

    #[arg(long)]
    run_name: String,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    features: Option<PathBuf>,

    #[arg(long)]
    features_hash: Option<String>,

    #[arg(long)]
    target: Option<PathBuf>,

    #[arg(long)]
    target_hash: Option<String>,

    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    output_hash: Option<String>,

    #[arg(long)]
    metrics: Option<PathBuf>,

    #[arg(long)]
    parameters: Option<PathBuf>,

    /// Serialized model file
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long)]
    requirements: Option<PathBuf>,

    #[arg(long, default_value = "3.9")]
    python: String,

    #[arg(long)]
    wait: bool,
}

impl ExternalArgs {
    /// Both forms of one input are passed through; the run rejects the pair
    fn training_run(&self) -> TrainingRun {
        TrainingRun::External(ExternalTraining {
            run_name: self.run_name.clone(),
            description: self.description.clone(),
            features: FileOrHash {
                file: self.features.clone(),
                hash: self.features_hash.clone(),
            },
            target: FileOrHash {
                file: self.target.clone(),
                hash: self.target_hash.clone(),
            },
            output: FileOrHash {
                file: self.output.clone(),
                hash: self.output_hash.clone(),
            },
            metrics: self.metrics.clone(),
            parameters: self.parameters.clone(),
            model: self.model.clone(),
            requirements: self.requirements.clone(),
            python_version: self.python.clone(),
        })
    }
}

#[derive(Args)]
struct PromoteArgs {
    #[command(flatten)]
    experiment: ExperimentRef,

    #[arg(long)]
    execution_id: u64,

    /// Model name
    #[arg(long)]
    name: String,

    /// Scoring function inside the source
    #[arg(long)]
    reference: String,

    #[arg(long)]
    source: PathBuf,

    /// sync or async
    #[arg(long, default_value = "sync")]
    operation: String,

    #[arg(long)]
    schema: Option<PathBuf>,

    #[arg(long)]
    input_type: Option<String>,

    #[arg(long)]
    requirements: Option<PathBuf>,

    #[arg(long)]
    env: Option<PathBuf>,

    #[arg(long = "extra")]
    extras: Vec<PathBuf>,

    /// Wait until the model is hosted
    #[arg(long)]
    wait: bool,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show the host status of a model
    Status(ModelRef),

    /// Wait until the model settles
    Wait(ModelRef),
}

#[derive(Args)]
struct ModelRef {
    #[arg(long)]
    group: String,

    #[arg(long)]
    model_hash: String,

    #[arg(long, default_value = "sync")]
    operation: String,
}

#[derive(Args)]
struct ScriptRef {
    #[arg(long)]
    group: String,

    #[arg(long)]
    script_hash: String,

    #[arg(long, default_value = "sync")]
    operation: String,
}

#[derive(Subcommand)]
enum PreprocessingCommands {
    /// Register a script, optionally hosting it
    Register {
        #[arg(long)]
        name: String,

        /// Function called inside the script
        #[arg(long)]
        reference: String,

        #[arg(long)]
        group: String,

        #[arg(long, default_value = "sync")]
        operation: String,

        #[arg(long, default_value = "3.9")]
        python: String,

        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        requirements: PathBuf,

        /// Input sample; required for sync scripts
        #[arg(long)]
        schema: Option<PathBuf>,

        #[arg(long)]
        env: Option<PathBuf>,

        #[arg(long = "extra")]
        extras: Vec<PathBuf>,

        /// Host right after registering
        #[arg(long)]
        host: bool,

        /// Wait until hosted (implies --host)
        #[arg(long)]
        wait: bool,
    },

    /// List registered scripts
    Search {
        #[arg(long, default_value = "sync")]
        operation: String,
    },

    /// Host status of a script
    Status(ScriptRef),

    /// Build logs of a script
    Logs(ScriptRef),

    /// Run a sync script with a JSON input
    RunSync {
        #[command(flatten)]
        script: ScriptRef,

        #[arg(long, env = "MLOPS_CODEX_GROUP_TOKEN", hide_env_values = true)]
        group_token: String,

        /// JSON document
        #[arg(long)]
        input: String,
    },

    /// Run an async script over a file or dataset hash
    RunAsync {
        #[command(flatten)]
        script: ScriptRef,

        #[arg(long, env = "MLOPS_CODEX_GROUP_TOKEN", hide_env_values = true)]
        group_token: String,

        /// Local file or dataset hash
        #[arg(long)]
        input: String,

        #[arg(long)]
        wait: bool,
    },
}

#[derive(Tabled)]
struct GroupRow {
    name: String,
    description: String,
}

#[derive(Tabled)]
struct ExperimentRow {
    training_hash: String,
    experiment_name: String,
    group: String,
    model_type: String,
}

#[derive(Tabled)]
struct ScriptRow {
    hash: String,
    group: String,
    name: String,
    status: String,
    python: String,
}

fn init_logging() -> Result<()> {
    let log_format =
        std::env::var("MLOPS_CODEX_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    // stderr keeps stdout for tables and JSON output
    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

fn connect(cli: &Cli) -> Result<MlopsCodexClient> {
    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    let credentials = match (&cli.login, &cli.password, &cli.tenant) {
        (Some(login), Some(password), Some(tenant)) => {
            Credentials::new(login.as_str(), password.as_str(), tenant.as_str())
        }
        _ => config.credentials.clone().context(
            "Missing credentials: use --login/--password/--tenant or MLOPS_CODEX_LOGIN, MLOPS_CODEX_PASSWORD, MLOPS_CODEX_TENANT",
        )?,
    };

    Ok(MlopsCodexClient::connect(config, credentials)?)
}

/// Configured interval, optional deadline, Ctrl+C cancels the wait
fn poll_options(client: &MlopsCodexClient, deadline_secs: Option<u64>) -> PollOptions {
    let (handle, token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling wait");
            handle.cancel();
        }
    });

    let options = client.poll_options().with_cancel(token);
    match deadline_secs {
        Some(secs) => options.with_deadline(Duration::from_secs(secs)),
        None => options,
    }
}

fn paint_execution(status: ExecutionStatus) -> colored::ColoredString {
    match status {
        ExecutionStatus::Succeeded => status.to_string().green().bold(),
        ExecutionStatus::Failed => status.to_string().red().bold(),
        _ => status.to_string().yellow(),
    }
}

fn paint_model(state: ModelState) -> colored::ColoredString {
    if state.is_success() {
        state.to_string().green().bold()
    } else if state.is_terminal() {
        state.to_string().red().bold()
    } else {
        state.to_string().yellow()
    }
}

fn print_message(message: Option<&str>) {
    if let Some(message) = message {
        println!("  {} {}", "Message:".bold(), message);
    }
}

async fn load_experiment(client: &MlopsCodexClient, r: &ExperimentRef) -> Result<Experiment> {
    client
        .training()
        .load_experiment(&r.group, &r.training_hash)
        .await
        .with_context(|| format!("Failed to load experiment {}", r.training_hash))
}

async fn run_training(
    client: &MlopsCodexClient,
    deadline: Option<u64>,
    experiment: &ExperimentRef,
    run: TrainingRun,
    wait: bool,
) -> Result<()> {
    let experiment = load_experiment(client, experiment).await?;
    let options = poll_options(client, deadline);

    let execution = client
        .training()
        .run(&experiment, &run, wait.then_some(&options))
        .await?;

    println!(
        "{}",
        format!("✓ Execution {} started", execution.execution_id)
            .green()
            .bold()
    );
    println!("  {} {}", "Status:".bold(), paint_execution(execution.status));
    Ok(())
}

async fn groups(client: &MlopsCodexClient, command: GroupCommands) -> Result<()> {
    let admin = client.admin();
    match command {
        GroupCommands::List => {
            let rows: Vec<GroupRow> = admin
                .list_groups()
                .await?
                .into_iter()
                .map(|g| GroupRow {
                    name: g.name,
                    description: g.description.unwrap_or_default(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        GroupCommands::Create { name, description } => {
            let token = admin.create_group(&name, &description).await?;
            println!("{}", "✓ Group created".green().bold());
            println!("  {} {}", "Token:".bold(), token);
            println!(
                "  {}",
                "Save this token, it will not be shown again.".yellow()
            );
        }
        GroupCommands::Refresh { name, force } => {
            let token = admin.refresh_group_token(&name, force).await?;
            println!("{}", format!("✓ Token refreshed for {name}").green().bold());
            println!("  {} {}", "Token:".bold(), token);
        }
    }
    Ok(())
}

async fn experiments(client: &MlopsCodexClient, command: ExperimentCommands) -> Result<()> {
    let training = client.training();
    match command {
        ExperimentCommands::Setup {
            name,
            model_type,
            group,
            force,
        } => {
            let mode = if force {
                RegistrationMode::Force
            } else {
                RegistrationMode::ReuseExisting
            };
            let experiment = training
                .setup_experiment(&name, &model_type, &group, mode)
                .await?;
            println!("{}", "✓ Experiment ready".green().bold());
            println!(
                "  {} {}",
                "Training hash:".bold(),
                experiment.training_hash
            );
        }
        ExperimentCommands::Search {
            name,
            group,
            model_type,
        } => {
            let query = ExperimentQuery {
                name,
                group,
                model_type: model_type.as_deref().map(ModelType::parse).transpose()?,
            };
            let rows: Vec<ExperimentRow> = training
                .search_experiments(&query)
                .await?
                .into_iter()
                .map(|e| ExperimentRow {
                    training_hash: e.training_hash,
                    experiment_name: e.experiment_name,
                    group: e.group,
                    model_type: e.model_type.unwrap_or_default(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }
    Ok(())
}

async fn train(
    client: &MlopsCodexClient,
    deadline: Option<u64>,
    command: TrainCommands,
) -> Result<()> {
    match command {
        TrainCommands::Custom(args) => {
            let run = TrainingRun::Custom(CustomTraining {
                run_name: args.run_name,
                description: args.description,
                training_reference: args.reference,
                python_version: args.python,
                input_data: args.input,
                source: args.source,
                requirements: args.requirements,
                env: args.env,
                extras: args.extras,
            });
            run_training(client, deadline, &args.experiment, run, args.wait).await
        }
        TrainCommands::Automl(args) => {
            let run = TrainingRun::AutoMl(AutoMlTraining {
                run_name: args.run_name,
                description: args.description,
                input_data: args.input,
                configuration: args.conf,
            });
            run_training(client, deadline, &args.experiment, run, args.wait).await
        }
        TrainCommands::External(args) => {
            let run = args.training_run();
            run_training(client, deadline, &args.experiment, run, args.wait).await
        }
        TrainCommands::Status {
            experiment,
            execution_id,
            wait,
        } => {
            let training = client.training();
            let experiment = load_experiment(client, &experiment).await?;
            let mut execution = training.load_execution(experiment, execution_id).await?;
            if wait && !execution.is_finished() {
                let options = poll_options(client, deadline);
                training.wait_execution(&mut execution, &options).await?;
            }
            println!("  {} {}", "Execution:".bold(), execution.execution_id);
            println!("  {} {}", "Status:".bold(), paint_execution(execution.status));
            print_message(execution.failure_message.as_deref());
            Ok(())
        }
    }
}

async fn promote(
    client: &MlopsCodexClient,
    deadline: Option<u64>,
    args: PromoteArgs,
) -> Result<()> {
    let training = client.training();
    let experiment = load_experiment(client, &args.experiment).await?;
    let execution = training
        .load_execution(experiment, args.execution_id)
        .await?;

    let mut request = PromoteRequest::new(
        args.name,
        args.reference,
        args.source,
        OperationKind::parse(&args.operation)?,
    );
    request.schema = args.schema;
    request.input_type = args.input_type;
    request.requirements = args.requirements;
    request.env = args.env;
    request.extras = args.extras;
    request.wait_complete = args.wait;

    let options = poll_options(client, deadline);
    let model = training.promote(&execution, &request, &options).await?;
    println!("{}", "✓ Model promoted".green().bold());
    println!("  {} {}", "Model hash:".bold(), model.model_hash);
    Ok(())
}

async fn models(
    client: &MlopsCodexClient,
    deadline: Option<u64>,
    command: ModelCommands,
) -> Result<()> {
    let (model, wait) = match command {
        ModelCommands::Status(r) => (r, false),
        ModelCommands::Wait(r) => (r, true),
    };
    let handle = ModelHandle {
        name: model.model_hash.clone(),
        model_hash: model.model_hash,
        group: model.group,
        operation: OperationKind::parse(&model.operation)?,
    };

    let models = client.models();
    let payload = if wait {
        models
            .wait_ready(&handle, &poll_options(client, deadline))
            .await?
    } else {
        models.status(&handle).await?
    };
    println!("  {} {}", "Model:".bold(), handle.model_hash);
    println!("  {} {}", "Status:".bold(), paint_model(payload.status));
    print_message(payload.message.as_deref());
    Ok(())
}

fn script_handle(script: ScriptRef) -> Result<PreprocessingHandle> {
    Ok(PreprocessingHandle {
        script_hash: script.script_hash,
        group: script.group,
        operation: OperationKind::parse(&script.operation)?,
        python_version: None,
    })
}

async fn preprocessing(
    client: &MlopsCodexClient,
    deadline: Option<u64>,
    command: PreprocessingCommands,
) -> Result<()> {
    let scripts = client.preprocessing();
    match command {
        PreprocessingCommands::Register {
            name,
            reference,
            group,
            operation,
            python,
            source,
            requirements,
            schema,
            env,
            extras,
            host,
            wait,
        } => {
            let script = PreprocessingScript {
                name,
                script_reference: reference,
                python_version: python,
                group,
                operation: OperationKind::parse(&operation)?,
                source,
                requirements,
                schema,
                env,
                extras,
            };
            let handle = scripts.register(&script).await?;
            println!("{}", "✓ Script registered".green().bold());
            println!("  {} {}", "Script hash:".bold(), handle.script_hash);

            if host || wait {
                scripts.host(&handle).await?;
                println!("{}", "✓ Host requested".green());
            }
            if wait {
                let payload = scripts
                    .wait_ready(&handle, &poll_options(client, deadline))
                    .await?;
                println!("  {} {}", "Status:".bold(), paint_model(payload.status));
                print_message(payload.message.as_deref());
            }
        }
        PreprocessingCommands::Search { operation } => {
            let rows: Vec<ScriptRow> = scripts
                .search(OperationKind::parse(&operation)?)
                .await?
                .into_iter()
                .map(|s| ScriptRow {
                    hash: s.hash,
                    group: s.group,
                    name: s.name.unwrap_or_default(),
                    status: s.status.unwrap_or_default(),
                    python: s.python_version.unwrap_or_default(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        PreprocessingCommands::Status(script) => {
            let payload = scripts.host_status(&script_handle(script)?).await?;
            println!("  {} {}", "Status:".bold(), paint_model(payload.status));
            print_message(payload.message.as_deref());
        }
        PreprocessingCommands::Logs(script) => {
            let logs = scripts.logs(&script_handle(script)?).await?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        PreprocessingCommands::RunSync {
            script,
            group_token,
            input,
        } => {
            let input: serde_json::Value =
                serde_json::from_str(&input).context("Invalid JSON input")?;
            let output = scripts
                .run_sync(&script_handle(script)?, &input, &group_token)
                .await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        PreprocessingCommands::RunAsync {
            script,
            group_token,
            input,
            wait,
        } => {
            let options = poll_options(client, deadline);
            let run = scripts
                .run_async(
                    &script_handle(script)?,
                    &input,
                    &group_token,
                    wait.then_some(&options),
                )
                .await?;
            println!(
                "{}",
                format!("✓ Execution {} started", run.execution_id)
                    .green()
                    .bold()
            );
            if let Some(outcome) = run.outcome {
                println!("  {} {}", "Status:".bold(), paint_execution(outcome.status));
                print_message(outcome.message.as_deref());
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let client = connect(&cli)?;
    let deadline = cli.deadline_secs;

    match cli.command {
        Commands::Groups { command } => groups(&client, command).await,
        Commands::Experiment { command } => experiments(&client, command).await,
        Commands::Train { command } => train(&client, deadline, command).await,
        Commands::Promote(args) => promote(&client, deadline, args).await,
        Commands::Model { command } => models(&client, deadline, command).await,
        Commands::Preprocessing { command } => preprocessing(&client, deadline, command).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let result = run(cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    result
}
