pub fn format_bytes(bytesval: usize, precision: usize) -> (String, String, String) {
    let mut val = bytesval as f32;

    for unit in ["bytes", "KiB", "MiB", "GiB", "TiB"] {
        if val < 1024.0 {
            return (
                format!("{:.precision$}", val, precision = precision),
                unit.to_owned(),
                format!("{:.precision$} {}", val, unit, precision = precision),
            );
        }

        val /= 1024.0;
    }

    (
        format!("{:.precision$}", bytesval, precision = precision),
        "".to_owned(),
        format!("{:.precision$}", bytesval, precision = precision),
    )
}

/// Replaces path separators and characters rejected by mainstream filesystems
/// so a title can never escape the output directory or fail `File::create`.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();
    let cleaned = cleaned.trim().trim_matches('.').trim();

    if cleaned.is_empty() {
        "untitled".to_owned()
    } else {
        cleaned.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_reserved_characters_are_replaced() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f"), "a_b_c_d_e_f");
    }

    #[test]
    fn path_escapes_are_neutralized() {
        let cleaned = sanitize_filename("../../etc/passwd");
        assert!(!cleaned.contains('/') && !cleaned.contains('\\'));
        assert!(!cleaned.starts_with('.'));
    }

    #[test]
    fn ordinary_titles_pass_through() {
        assert_eq!(sanitize_filename("Episode 01 - Pilot"), "Episode 01 - Pilot");
    }

    #[test]
    fn empty_titles_get_a_placeholder() {
        assert_eq!(sanitize_filename("..."), "untitled");
    }

    #[test]
    fn formats_byte_counts() {
        assert_eq!(format_bytes(1536, 1).2, "1.5 KiB");
        assert_eq!(format_bytes(10, 0).2, "10 bytes");
    }
}
