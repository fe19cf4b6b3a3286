fn main() {
    #[cfg(feature = "cli")]
    romtool::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("romtool: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
