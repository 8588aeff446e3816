use remarx_lib::context::RemarxContext;
use remarx_lib::db::driver::DatabaseDriver;
use remarx_lib::runtime::Runtime;

pub use remarx_test_util::model::model_dir;

/// Create a [`Runtime`] with an in-memory cache database and a tempdir-based
/// context.
///
/// The `name` must be unique per test to prevent cross-test DB collisions.
/// The caller must hold the returned [`tempfile::TempDir`] to keep the
/// temporary directory alive for the duration of the test.
pub fn runtime_in_memory(name: &str) -> (tempfile::TempDir, Runtime) {
    let tmp = tempfile::tempdir().unwrap();
    let context = RemarxContext::new(tmp.path());
    let cache_db = DatabaseDriver::in_memory(name).unwrap();
    (tmp, Runtime { context, cache_db })
}

/// Like [`runtime_in_memory`], but loading models from the real model
/// directory.
pub fn runtime_with_model(name: &str) -> (tempfile::TempDir, Runtime) {
    let (tmp, runtime) = runtime_in_memory(name);
    let context = runtime.context.with_model_cache_dir(model_dir());
    (
        tmp,
        Runtime {
            context,
            cache_db: runtime.cache_db,
        },
    )
}

/// Strip margin markers from a multi-line string (Kotlin-style `trimMargin`).
///
/// Each line is scanned for the first `|` character after optional leading
/// whitespace. Everything before and including the `|` is removed. Lines that
/// do not contain a leading `|` are dropped.
///
/// Use `\|` to include a literal `|` in the output.
pub fn _trim_margin(s: &str) -> String {
    s.lines()
        .filter_map(|line| {
            line.trim_start()
                .strip_prefix('|')
                .map(|rest| rest.replace("\\|", "|"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a margin-trimmed string with `format!`-style interpolation.
macro_rules! trim_margin {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::test_util::_trim_margin(&format!($fmt $(, $arg)*))
    };
}
pub(crate) use trim_margin;

#[cfg(test)]
mod tests {
    use super::_trim_margin;

    #[test]
    fn trim_margin_strips_prefix() {
        let result = _trim_margin(
            "|Precision: 0.5000
             |  Recall: 1.0000
             |",
        );
        assert_eq!(result, "Precision: 0.5000\n  Recall: 1.0000\n");
    }

    #[test]
    fn trim_margin_escaped_pipe_and_unmarked_lines() {
        let result = _trim_margin(
            "dropped
             |a \\| b",
        );
        assert_eq!(result, "a | b");
    }
}
