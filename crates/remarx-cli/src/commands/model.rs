use std::io::{Read, Write};
use std::path::Path;

use remarx_lib::config::DEFAULT_MODEL_NAME;
use remarx_lib::embedding::embedder::{MODEL_FILES, ONNX_FILE};
use remarx_lib::output::ConsoleIO;
use remarx_lib::runtime::Runtime;

/// Hugging Face repository with the ONNX export of the sentence model.
const HF_REPO: &str = "Xenova/paraphrase-multilingual-mpnet-base-v2";

/// Remote path of a model file inside [`HF_REPO`].
fn remote_path(local_name: &str) -> String {
    if local_name == ONNX_FILE {
        format!("onnx/{local_name}")
    } else {
        local_name.to_string()
    }
}

fn is_complete(model_dir: &Path) -> bool {
    MODEL_FILES.iter().all(|name| model_dir.join(name).exists())
}

/// Run the `remarx model download` command.
pub fn run_model_download<IN, OUT, ERR>(
    force: bool,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let model_dir = runtime.context.model_cache_dir().join(DEFAULT_MODEL_NAME);

    if force && model_dir.exists() {
        writeln!(io.stderr(), "Removing existing model files...")?;
        std::fs::remove_dir_all(&model_dir)?;
    }

    if !force && is_complete(&model_dir) {
        writeln!(
            io.stdout(),
            "Model already downloaded at {}",
            model_dir.display()
        )?;
        return Ok(());
    }

    std::fs::create_dir_all(&model_dir)?;

    writeln!(io.stderr(), "Downloading {DEFAULT_MODEL_NAME}...")?;
    let api = hf_hub::api::sync::Api::new()?;
    let repo = api.model(HF_REPO.to_string());

    for local_name in MODEL_FILES {
        let dest = model_dir.join(local_name);
        if dest.exists() {
            writeln!(io.stderr(), "  {local_name} (cached)")?;
            continue;
        }
        writeln!(io.stderr(), "  {local_name}...")?;
        let cached = repo.get(&remote_path(local_name))?;
        std::fs::copy(&cached, &dest)?;
    }

    writeln!(io.stdout(), "Model downloaded to {}", model_dir.display())?;
    Ok(())
}
