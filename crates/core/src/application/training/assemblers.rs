// Training Assemblers - one multipart layout per training type

use crate::application::uploader::{
    attach_extras, attach_file, attach_file_or_hash, attach_optional, resolve_file_or_dataset,
};
use crate::domain::{AutoMlTraining, CustomTraining, ExternalTraining, PythonVersion, TrainingRun};
use crate::error::Result;
use crate::port::http_transport::MultipartForm;

/// Field holding an uploaded training dataset
pub const TRAIN_DATA_FIELD: &str = "train_data";

/// Field holding the hash of a stored training dataset
pub const DATASET_HASH_FIELD: &str = "dataset_hash";

/// Build the upload form for `run`
///
/// Runs the local validation first, so a rejected run opens no files.
pub fn assemble(run: &TrainingRun) -> Result<MultipartForm> {
    run.validate()?;
    let mut form = MultipartForm::new()
        .text("run_name", run.run_name())
        .text("training_type", run.training_type());

    match run {
        TrainingRun::Custom(custom) => assemble_custom(custom, &mut form)?,
        TrainingRun::AutoMl(automl) => assemble_automl(automl, &mut form)?,
        TrainingRun::External(external) => assemble_external(external, &mut form)?,
    }
    Ok(form)
}

fn assemble_custom(run: &CustomTraining, form: &mut MultipartForm) -> Result<()> {
    let python = PythonVersion::parse(&run.python_version)?;
    form.set_text("training_reference", run.training_reference.as_str());
    form.set_text("python_version", python.as_platform_token());
    if let Some(description) = &run.description {
        form.set_text("description", description.as_str());
    }

    attach_file(form, "source", &run.source)?;
    attach_file(form, "requirements", &run.requirements)?;
    resolve_file_or_dataset(&run.input_data, form, TRAIN_DATA_FIELD, DATASET_HASH_FIELD)?;
    attach_optional(form, "env", run.env.as_deref())?;
    attach_extras(form, &run.extras)
}

fn assemble_automl(run: &AutoMlTraining, form: &mut MultipartForm) -> Result<()> {
    if let Some(description) = &run.description {
        form.set_text("description", description.as_str());
    }
    attach_file(form, "conf_dict", &run.configuration)?;
    resolve_file_or_dataset(&run.input_data, form, TRAIN_DATA_FIELD, DATASET_HASH_FIELD)?;
    Ok(())
}

fn assemble_external(run: &ExternalTraining, form: &mut MultipartForm) -> Result<()> {
    let python = PythonVersion::parse(&run.python_version)?;
    form.set_text("python_version", python.as_platform_token());
    if let Some(description) = &run.description {
        form.set_text("description", description.as_str());
    }

    attach_file_or_hash(form, &run.features, "features")?;
    attach_file_or_hash(form, &run.target, "target")?;
    attach_file_or_hash(form, &run.output, "output")?;
    attach_optional(form, "metrics", run.metrics.as_deref())?;
    attach_optional(form, "parameters", run.parameters.as_deref())?;
    attach_optional(form, "model", run.model.as_deref())?;
    attach_optional(form, "requirements", run.requirements.as_deref())
}
