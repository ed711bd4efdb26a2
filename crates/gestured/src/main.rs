use std::process::ExitCode;

fn main() -> ExitCode {
    gestured::run()
}
