use super::EngineError;
use std::path::Path;

pub const REQUIRED_MODEL_FILES: [&str; 4] =
    ["bigvgan_generator.pth", "bpe.model", "gpt.pth", "config.yaml"];

/// Check that every model artifact exists under `model_dir`.
///
/// Runs before the server binds; a missing file aborts startup.
pub fn verify_model_artifacts(model_dir: &Path) -> Result<(), EngineError> {
    tracing::info!(model_dir = %model_dir.display(), "Checking model files");

    for file in REQUIRED_MODEL_FILES {
        let path = model_dir.join(file);
        if !path.is_file() {
            tracing::error!(file, path = %path.display(), "Required model file missing");
            return Err(EngineError::MissingArtifact {
                file: file.to_string(),
                path,
            });
        }
        tracing::info!(file, "Model file present");
    }

    Ok(())
}
