use std::process::ExitCode;

fn main() -> ExitCode {
    hookgate::run()
}
