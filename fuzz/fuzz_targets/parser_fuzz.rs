#![no_main]
use libfuzzer_sys::fuzz_target;

const SUBCOMMANDS: [&str; 6] = ["patch", "info", "strip-header", "fix-checksum", "hash", "config"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let mut args = vec![SUBCOMMANDS[selector as usize % SUBCOMMANDS.len()].to_string()];
    args.extend(
        String::from_utf8_lossy(rest)
            .split_whitespace()
            .take(16)
            .map(str::to_string),
    );
    romtool::cli::fuzz_try_parse_args(&args);
});
