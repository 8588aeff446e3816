use std::process::ExitCode;

use remarx_lib::context::RemarxContext;
use remarx_lib::output::StdIO;
use remarx_lib::runtime::Runtime;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let context = match RemarxContext::from_env() {
        Ok(context) => context,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let runtime = Runtime::new(context);
    let mut io = StdIO::new();

    match remarx_cli::try_run(&args, &runtime, &mut io) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(clap_err) => clap_err.exit(),
            Err(err) => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}
