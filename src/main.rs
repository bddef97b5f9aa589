fn main() {
    if let Err(err) = graphtag::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
