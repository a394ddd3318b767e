fn main() {
    #[cfg(feature = "cli")]
    shapatch::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("shapatch: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
