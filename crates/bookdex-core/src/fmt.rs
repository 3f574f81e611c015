//! Byte-count rendering for listing and summary output.

const PREFIXES: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];

/// Render a byte count with binary (`kiB`, `MiB`, …) or decimal (`kB`,
/// `MB`, …) multiples.
pub fn human_bytes(size: u64, binary: bool, precision: usize) -> String {
    if size == 0 {
        return "0 B".to_string();
    }

    let base: f64 = if binary { 1024.0 } else { 1000.0 };
    let exponent = ((size as f64).log2() / base.log2()).trunc() as usize;
    let exponent = exponent.min(PREFIXES.len() - 1);

    if exponent == 0 {
        return format!("{} B", size);
    }

    let value = size as f64 / base.powi(exponent as i32);
    let infix = if binary { "i" } else { "" };
    format!("{:.*} {}{}B", precision, value, PREFIXES[exponent], infix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_sizes_render_as_plain_bytes() {
        assert_eq!(human_bytes(0, true, 2), "0 B");
        assert_eq!(human_bytes(1, true, 2), "1 B");
        assert_eq!(human_bytes(512, true, 2), "512 B");
        assert_eq!(human_bytes(999, false, 2), "999 B");
    }

    #[test]
    fn test_binary_multiples() {
        assert_eq!(human_bytes(2048, true, 2), "2.00 kiB");
        assert_eq!(human_bytes(1024 * 1024, true, 1), "1.0 MiB");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024, true, 0), "3 GiB");
    }

    #[test]
    fn test_decimal_multiples() {
        assert_eq!(human_bytes(1500, false, 2), "1.50 kB");
        assert_eq!(human_bytes(2_000_000, false, 1), "2.0 MB");
    }
}
