#![no_main]
use libfuzzer_sys::fuzz_target;
use romtool::rom;

fuzz_target!(|data: &[u8]| {
    // Header probing and checksum math on arbitrary images.
    if let Ok(header) = rom::locate_header(data) {
        let _ = rom::compute_checksum(data, header.offset);
        let mut image = data.to_vec();
        rom::fix_checksum(&mut image, Some(header.layout)).unwrap();
    }
    let _ = rom::strip_copier_header(data);
});
