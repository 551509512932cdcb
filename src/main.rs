fn main() -> std::process::ExitCode {
    daily_focus_lib::run()
}
