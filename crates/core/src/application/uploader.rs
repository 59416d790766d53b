// Artifact Uploader - file-or-dataset resolution into multipart forms

use crate::domain::{Artifact, FileOrHash};
use crate::error::Result;
use crate::port::http_transport::{FilePart, MultipartForm};
use std::path::Path;
use tracing::{debug, warn};

/// Attach `input` as a file part when it names an existing regular file,
/// otherwise as the `dataset_field` text field.
///
/// A path-looking string that does not exist is still sent as a dataset
/// hash; it is only logged.
pub fn resolve_file_or_dataset(
    input: &str,
    form: &mut MultipartForm,
    file_field: &str,
    dataset_field: &str,
) -> Result<Artifact> {
    let path = Path::new(input);
    if path.is_file() {
        form.files.push(FilePart::open(file_field, path)?);
        debug!(field = file_field, path = %path.display(), "Attached input file");
        return Ok(Artifact::File(path.to_path_buf()));
    }

    if looks_like_path(input) {
        warn!(
            input = %input,
            field = dataset_field,
            "Input is not an existing file, sending it as a dataset hash"
        );
    }
    form.set_text(dataset_field, input);
    Ok(Artifact::Dataset(input.to_string()))
}

/// Attach an explicit file-or-hash input as `<name>` or `<name>_hash`
pub fn attach_file_or_hash(
    form: &mut MultipartForm,
    input: &FileOrHash,
    name: &str,
) -> Result<Artifact> {
    let artifact = input.resolve(name)?;
    match &artifact {
        Artifact::File(path) => form.files.push(FilePart::open(name, path)?),
        Artifact::Dataset(hash) => form.set_text(format!("{name}_hash"), hash.as_str()),
    }
    Ok(artifact)
}

pub fn attach_file(form: &mut MultipartForm, field: &str, path: &Path) -> Result<()> {
    form.files.push(FilePart::open(field, path)?);
    Ok(())
}

pub fn attach_optional(form: &mut MultipartForm, field: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => attach_file(form, field, path),
        None => Ok(()),
    }
}

/// Every extra file goes under the repeated `extra` field
pub fn attach_extras<P: AsRef<Path>>(form: &mut MultipartForm, extras: &[P]) -> Result<()> {
    for extra in extras {
        attach_file(form, "extra", extra.as_ref())?;
    }
    Ok(())
}

fn looks_like_path(input: &str) -> bool {
    input.contains('/')
        || input.contains('\\')
        || Path::new(input)
            .extension()
            .map_or(false, |e| e.len() <= 7 && !e.is_empty())
}
