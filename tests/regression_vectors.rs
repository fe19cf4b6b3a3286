use romtool::ips::{PatchBuffer, apply_patch};

#[derive(Debug)]
struct Vector {
    name: String,
    seed: Vec<u8>,
    patch: Vec<u8>,
    expected: Vec<u8>,
}

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s = s.trim();
    if s.is_empty() {
        return Vec::new();
    }
    assert!(
        s.len().is_multiple_of(2),
        "hex string must have even length"
    );
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn load_vectors() -> Vec<Vector> {
    let manifest = include_str!("vectors/manifest.tsv");
    manifest
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| {
            let parts: Vec<_> = line.split('|').collect();
            assert_eq!(parts.len(), 4, "invalid vector row: {line}");
            Vector {
                name: parts[0].to_string(),
                seed: hex_to_bytes(parts[1]),
                patch: hex_to_bytes(parts[2]),
                expected: hex_to_bytes(parts[3]),
            }
        })
        .collect()
}

#[test]
fn vector_database_is_non_empty() {
    let vectors = load_vectors();
    assert!(!vectors.is_empty());
}

#[test]
fn all_vectors_apply() {
    for v in load_vectors() {
        let mut buf = PatchBuffer::from(v.seed.clone());
        apply_patch(&mut buf, &v.patch[..]).unwrap_or_else(|e| panic!("vector {}: {e}", v.name));
        assert_eq!(buf.as_slice(), &v.expected[..], "vector {}", v.name);
    }
}

#[test]
fn all_vectors_never_shrink_seed() {
    for v in load_vectors() {
        let mut buf = PatchBuffer::from(v.seed.clone());
        apply_patch(&mut buf, &v.patch[..]).unwrap();
        assert!(buf.len() >= v.seed.len(), "vector {}", v.name);
    }
}
