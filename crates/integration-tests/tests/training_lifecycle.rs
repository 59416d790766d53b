//! Training lifecycle: group, experiment, execution, promotion, hosting

mod common;

use common::{Harness, Samples};
use mlops_codex_core::port::HttpMethod;
use mlops_codex_sdk::{
    CodexError, CustomTraining, ExecutionStatus, ExternalTraining, FileOrHash, ModelType,
    OperationKind, PromoteRequest, RegistrationMode, TrainingRun,
};
use serde_json::json;

fn custom_run(samples: &Samples, python_version: &str) -> TrainingRun {
    TrainingRun::Custom(CustomTraining {
        run_name: "first".into(),
        training_reference: "train_model".into(),
        python_version: python_version.into(),
        input_data: samples.path("train.csv").to_string_lossy().into_owned(),
        source: samples.path("app.py"),
        requirements: samples.path("requirements.txt"),
        ..Default::default()
    })
}

fn script_known_groups(h: &Harness) {
    h.transport.on(
        HttpMethod::Get,
        "/groups",
        200,
        json!({"Results": [{"Name": "teama", "Description": "analytics"}]}),
    );
}

fn script_experiment_routes(h: &Harness) {
    script_known_groups(h);
    h.transport.on(
        HttpMethod::Get,
        "/training/search",
        200,
        json!({"Results": []}),
    );
    h.transport.on(
        HttpMethod::Post,
        "/training/register/teama",
        201,
        json!({"TrainingHash": "T1"}),
    );
    h.transport.on(
        HttpMethod::Post,
        "/training/upload/teama/T1",
        201,
        json!({"ExecutionId": 7}),
    );
    h.transport.on(
        HttpMethod::Get,
        "/training/execute/teama/T1/7",
        200,
        json!({"Message": "Execution requested"}),
    );
}

/// Group → Custom experiment → run → Succeeded → promote with schema
#[tokio::test]
async fn test_custom_training_to_hosted_model() {
    let h = Harness::new();
    let samples = Samples::new();

    h.transport.on(
        HttpMethod::Post,
        "/groups",
        201,
        json!({"Token": "group-token"}),
    );
    script_experiment_routes(&h);
    for status in ["Requested", "Running", "Running", "Succeeded"] {
        h.transport.on(
            HttpMethod::Get,
            "/training/status/teama/7",
            200,
            json!({"Status": status}),
        );
    }
    h.transport.on(
        HttpMethod::Post,
        "/training/promote/teama/T1/7",
        201,
        json!({"ModelHash": "M1"}),
    );
    h.transport
        .on(HttpMethod::Get, "/model/sync/host/teama/M1", 202, json!({}));
    for status in ["Building", "Deployed"] {
        h.transport.on(
            HttpMethod::Get,
            "/model/status/teama/M1",
            200,
            json!({"Status": status}),
        );
    }

    let group_token = h
        .client
        .admin()
        .create_group("teamA", "analytics")
        .await
        .unwrap();
    assert_eq!(group_token, "group-token");
    assert_eq!(
        h.transport.requests_to("/groups")[0].form_field("name"),
        Some("teama")
    );

    let training = h.client.training();
    let experiment = training
        .setup_experiment(
            "churn",
            "classification",
            "teamA",
            RegistrationMode::ReuseExisting,
        )
        .await
        .unwrap();
    assert_eq!(experiment.training_hash, "T1");
    assert_eq!(experiment.group, "teama");
    assert_eq!(h.transport.count(HttpMethod::Get, "/groups"), 1);
    assert_eq!(experiment.model_type, ModelType::Classification);

    let options = h.client.poll_options();
    let execution = training
        .run(&experiment, &custom_run(&samples, "3.9"), Some(&options))
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
    assert_eq!(
        h.transport
            .count(HttpMethod::Get, "/training/status/teama/7"),
        4
    );

    let upload = &h.transport.requests_to("/training/upload/teama/T1")[0];
    assert_eq!(upload.form_field("training_type"), Some("Custom"));
    assert_eq!(upload.form_field("python_version"), Some("Python39"));
    assert_eq!(upload.form_field("training_reference"), Some("train_model"));
    let mut files = upload.file_fields();
    files.sort_unstable();
    assert_eq!(files, vec!["requirements", "source", "train_data"]);

    let mut request = PromoteRequest::new(
        "churn-model",
        "score",
        samples.path("app.py"),
        OperationKind::Sync,
    )
    .with_schema(samples.path("schema.json"));
    request.wait_complete = true;

    let model = training
        .promote(&execution, &request, &options)
        .await
        .unwrap();
    assert!(!model.model_hash.is_empty());
    assert!(matches!(
        model.operation,
        OperationKind::Sync | OperationKind::Async
    ));

    let promote = &h.transport.requests_to("/training/promote/teama/T1/7")[0];
    assert_eq!(promote.form_field("name"), Some("churn-model"));
    assert!(promote.file_fields().contains(&"schema"));
    assert_eq!(
        h.transport.count(HttpMethod::Get, "/model/status/teama/M1"),
        2
    );

    // One login for the whole flow
    assert_eq!(h.transport.count(HttpMethod::Post, "/login"), 1);
}

/// Promoting a Running execution fails locally
#[tokio::test]
async fn test_promote_running_execution_is_rejected_locally() {
    let h = Harness::new();
    let samples = Samples::new();
    h.transport.on(
        HttpMethod::Get,
        "/training/describe/teama/T1",
        200,
        json!({"Description": {"ExperimentName": "churn", "ModelType": "Regression", "GroupName": "teama"}}),
    );
    h.transport.on(
        HttpMethod::Get,
        "/training/status/teama/7",
        200,
        json!({"Status": "Running"}),
    );

    let training = h.client.training();
    let experiment = training.load_experiment("teama", "T1").await.unwrap();
    let execution = training.load_execution(experiment, 7).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Running);

    let request = PromoteRequest::new(
        "churn-model",
        "score",
        samples.path("app.py"),
        OperationKind::Sync,
    )
    .with_schema(samples.path("schema.json"));
    let err = training
        .promote(&execution, &request, &h.client.poll_options())
        .await
        .unwrap_err();

    match err {
        CodexError::Training(message) => assert!(message.contains("must be Succeeded")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        h.transport
            .count(HttpMethod::Post, "/training/promote/teama/T1/7"),
        0
    );
}

#[tokio::test]
async fn test_failed_run_carries_platform_message() {
    let h = Harness::new();
    let samples = Samples::new();
    script_experiment_routes(&h);
    h.transport.on(
        HttpMethod::Get,
        "/training/status/teama/7",
        200,
        json!({"Status": "Running"}),
    );
    h.transport.on(
        HttpMethod::Get,
        "/training/status/teama/7",
        200,
        json!({"Status": "Failed", "Message": "ModuleNotFoundError: sklearn"}),
    );

    let training = h.client.training();
    let experiment = training
        .setup_experiment("churn", "Classification", "teama", RegistrationMode::Force)
        .await
        .unwrap();
    assert_eq!(h.transport.count(HttpMethod::Get, "/training/search"), 0);

    let err = training
        .run(
            &experiment,
            &custom_run(&samples, "3.10"),
            Some(&h.client.poll_options()),
        )
        .await
        .unwrap_err();
    match err {
        CodexError::TrainExecution {
            execution_id,
            message,
        } => {
            assert_eq!(execution_id, 7);
            assert_eq!(message.as_deref(), Some("ModuleNotFoundError: sklearn"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_existing_experiment_is_reused() {
    let h = Harness::new();
    script_known_groups(&h);
    h.transport.on(
        HttpMethod::Get,
        "/training/search",
        200,
        json!({"Results": [
            {"TrainingHash": "T0", "ExperimentName": "churn", "GroupName": "teama", "ModelType": "Regression"},
            {"TrainingHash": "T9", "ExperimentName": "churn", "GroupName": "teama", "ModelType": "Classification"}
        ]}),
    );

    let experiment = h
        .client
        .training()
        .setup_experiment(
            "churn",
            "Classification",
            "teama",
            RegistrationMode::ReuseExisting,
        )
        .await
        .unwrap();
    assert_eq!(experiment.training_hash, "T9");
    assert_eq!(
        h.transport
            .count(HttpMethod::Post, "/training/register/teama"),
        0
    );
}

#[tokio::test]
async fn test_experiment_in_unknown_group_is_rejected() {
    let h = Harness::new();
    script_experiment_routes(&h);

    let err = h
        .client
        .training()
        .setup_experiment("churn", "Classification", "Team B", RegistrationMode::Force)
        .await
        .unwrap_err();
    match err {
        CodexError::Group(message) => assert!(message.contains("team_b")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.transport.count(HttpMethod::Get, "/groups"), 1);
    assert!(h.transport.requests_to("/training/register/team_b").is_empty());
    assert_eq!(h.transport.count(HttpMethod::Post, "/training/register/teama"), 0);
}

/// Local validation failures never reach the network
#[tokio::test]
async fn test_invalid_inputs_send_nothing() {
    let h = Harness::new();
    let samples = Samples::new();
    let training = h.client.training();

    let err = training
        .setup_experiment("churn", "Forecasting", "teama", RegistrationMode::Force)
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::Input(_)));

    let experiment = mlops_codex_sdk::Experiment {
        training_hash: "T1".into(),
        experiment_name: "churn".into(),
        model_type: ModelType::Classification,
        group: "teama".into(),
    };

    let err = training
        .run(&experiment, &custom_run(&samples, "3.7"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::PythonVersion(_)));

    let external = TrainingRun::External(ExternalTraining {
        run_name: "imported".into(),
        features: FileOrHash {
            file: Some(samples.path("features.csv")),
            hash: Some("D1".into()),
        },
        target: FileOrHash::hash("D2"),
        output: FileOrHash::hash("D3"),
        python_version: "3.9".into(),
        ..Default::default()
    });
    let err = training.run(&experiment, &external, None).await.unwrap_err();
    assert!(matches!(err, CodexError::Input(_)));
    assert!(err.is_local());

    assert_eq!(h.transport.total_requests(), 0);
}

#[tokio::test]
async fn test_external_run_uploads_files_and_hashes() {
    let h = Harness::new();
    let samples = Samples::new();
    script_experiment_routes(&h);

    let experiment = mlops_codex_sdk::Experiment {
        training_hash: "T1".into(),
        experiment_name: "imported".into(),
        model_type: ModelType::Regression,
        group: "teama".into(),
    };
    let external = TrainingRun::External(ExternalTraining {
        run_name: "imported".into(),
        features: FileOrHash::file(samples.path("features.csv")),
        target: FileOrHash::hash("D2"),
        output: FileOrHash::hash("D3"),
        python_version: "3.8".into(),
        ..Default::default()
    });

    let execution = h
        .client
        .training()
        .run(&experiment, &external, None)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Requested);

    let upload = &h.transport.requests_to("/training/upload/teama/T1")[0];
    assert_eq!(upload.form_field("training_type"), Some("External"));
    assert_eq!(upload.file_fields(), vec!["features"]);
    assert_eq!(upload.form_field("target_hash"), Some("D2"));
    assert_eq!(upload.form_field("output_hash"), Some("D3"));
    assert_eq!(h.transport.count(HttpMethod::Get, "/training/status/teama/7"), 0);
}
