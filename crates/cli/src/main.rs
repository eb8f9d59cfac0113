use std::process::ExitCode;

fn main() -> ExitCode {
    refineai_cli::run()
}
