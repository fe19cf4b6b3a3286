#![no_main]
use libfuzzer_sys::fuzz_target;
use romtool::ips::{PatchBuffer, apply_patch};

fuzz_target!(|data: &[u8]| {
    // Apply arbitrary bytes as a patch. Must never panic: malformed
    // input either fails the magic check or degrades leniently.
    let mut buf = PatchBuffer::new();
    let _ = apply_patch(&mut buf, data);

    // Same body behind a valid magic, over a non-empty seed.
    let mut stream = b"PATCH".to_vec();
    stream.extend_from_slice(data);
    let mut seeded = PatchBuffer::from(vec![0xA5; 256]);
    let before = seeded.len();
    apply_patch(&mut seeded, &stream[..]).unwrap();
    assert!(seeded.len() >= before);
});
