use std::path::PathBuf;

/// Return the model cache directory for tests.
///
/// Checks `REMARX_MODEL_DIR` first, falling back to `~/.remarx/models/`.
pub fn model_dir() -> PathBuf {
    std::env::var("REMARX_MODEL_DIR").map_or_else(
        |_| {
            dirs::home_dir()
                .expect("home dir")
                .join(".remarx")
                .join("models")
        },
        PathBuf::from,
    )
}
