use rand::Rng;

const SUFFIX_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LENGTH: usize = 10;

/// Mints an activation token under the configured prefix so the router's
/// pre-filter always recognizes tokens it issued itself.
pub fn gen_token(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LENGTH)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect();
    format!("{}-{}", prefix, suffix)
}
