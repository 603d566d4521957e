fn main() {
    if let Err(err) = csv_user_loader::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
