fn main() {
    if let Err(err) = opsdesk_lib::run() {
        eprintln!("{}", opsdesk_lib::error::user_message(&err, "load the dashboard"));
        std::process::exit(1);
    }
}
