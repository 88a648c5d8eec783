use chrono::Utc;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a submission id: `fms_<base36 millis>_<base36 random, up to 6 chars>`.
pub fn generate() -> String {
    let timestamp = Utc::now().timestamp_millis().max(0) as u64;
    let random = rand::random::<u64>() % 36u64.pow(6);
    format!("fms_{}_{}", to_base36(timestamp), to_base36(random))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
