fn main() {
    if let Err(err) = meh::cli::main() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
