use std::process::ExitCode;

fn main() -> ExitCode {
    tvmc_tools::cli::run()
}
