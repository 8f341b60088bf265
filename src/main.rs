use std::process::ExitCode;

fn main() -> ExitCode {
    match rowan_chess::uci::uci_top::run_stdio_loop() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("fatal: {error}");
            ExitCode::FAILURE
        }
    }
}
