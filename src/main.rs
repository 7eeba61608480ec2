fn main() {
    if let Err(err) = workpulse::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
