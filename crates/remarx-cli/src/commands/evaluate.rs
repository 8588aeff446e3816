use std::io::{Read, Write};
use std::path::Path;

use remarx_lib::eval::{evaluate_pairs, load_ground_truth, load_scored_pairs, read_ground_truth};
use remarx_lib::output::ConsoleIO;

/// Run the `remarx evaluate` command. A ground truth of `-` is read from
/// stdin.
pub fn run_evaluate<IN, OUT, ERR>(
    pairs_path: &Path,
    ground_truth_path: &Path,
    cutoff: f32,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: Read,
    OUT: Write,
    ERR: Write,
{
    let pairs = load_scored_pairs(pairs_path)?;
    let ground_truth = if ground_truth_path == Path::new("-") {
        read_ground_truth(io.stdin(), Path::new("<stdin>"))?
    } else {
        load_ground_truth(ground_truth_path)?
    };
    if ground_truth.is_empty() {
        writeln!(io.stderr(), "Ground truth has no pairs; recall is reported as 0")?;
    }

    let report = evaluate_pairs(&pairs, &ground_truth, cutoff);
    writeln!(io.stdout(), "Cutoff: {cutoff}")?;
    writeln!(
        io.stdout(),
        "Retrieved: {} ({} correct of {} known quotations)",
        report.retrieved,
        report.true_positives,
        report.ground_truth
    )?;
    writeln!(io.stdout(), "Precision: {:.4}", report.precision)?;
    writeln!(io.stdout(), "Recall: {:.4}", report.recall)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use remarx_lib::output::BufferedIO;
    use remarx_test_util::corpus::write_raw;

    use crate::test_util::{runtime_in_memory, trim_margin};

    const PAIRS: &str = "reuse_id,reuse_text,original_id,original_text,match_score\n\
                         r1,x,o1,y,0.95\n\
                         r2,x,o2,y,0.85\n\
                         r3,x,o9,y,0.6\n";

    #[test]
    fn try_run_evaluate_prints_metrics() {
        let (tmp, runtime) = runtime_in_memory("evaluate_file");
        let pairs = write_raw(tmp.path(), "pairs.csv", PAIRS);
        let truth = write_raw(
            tmp.path(),
            "truth.csv",
            "reuse_id,original_id\nr1,o1\nr3,o9\nr4,o4\n",
        );

        let mut io = BufferedIO::new();
        crate::try_run(
            &[
                "remarx",
                "evaluate",
                &pairs.display().to_string(),
                &truth.display().to_string(),
            ],
            &runtime,
            &mut io,
        )
        .unwrap();

        assert_eq!(
            io.stdout_to_string(),
            trim_margin!(
                "|Cutoff: 0.8
                 |Retrieved: 2 (1 correct of 3 known quotations)
                 |Precision: 0.5000
                 |Recall: 0.3333
                 |"
            )
        );
    }

    #[test]
    fn try_run_evaluate_reads_ground_truth_from_stdin() {
        let (tmp, runtime) = runtime_in_memory("evaluate_stdin");
        let pairs = write_raw(tmp.path(), "pairs.csv", PAIRS);

        let mut io = BufferedIO::with_stdin("reuse_id,original_id\nr1,o1\nr2,o2\n");
        crate::try_run(
            &[
                "remarx",
                "evaluate",
                &pairs.display().to_string(),
                "-",
                "--cutoff",
                "0.5",
            ],
            &runtime,
            &mut io,
        )
        .unwrap();

        let stdout = io.stdout_to_string();
        assert!(stdout.contains("Retrieved: 3 (2 correct of 2 known quotations)"), "{stdout}");
        assert!(stdout.contains("Recall: 1.0000"), "{stdout}");
    }

    #[test]
    fn try_run_evaluate_rejects_missing_pairs_file() {
        let (tmp, runtime) = runtime_in_memory("evaluate_missing");
        let missing = tmp.path().join("missing.csv").display().to_string();

        let mut io = BufferedIO::new();
        let err = crate::try_run(&["remarx", "evaluate", &missing, "-"], &runtime, &mut io)
            .unwrap_err();
        assert!(err.to_string().contains("missing.csv"), "{err:#}");
    }
}
