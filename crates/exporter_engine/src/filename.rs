use chrono::Local;

/// Timestamp suffix shared by every file of one run, so re-runs never
/// collide: `%Y_%m_%d_%H_%M_%S` in local time.
pub fn run_timestamp() -> String {
    Local::now().format("%Y_%m_%d_%H_%M_%S").to_string()
}

/// Windows-safe, timestamp-suffixed filename:
/// `{base}[_{qualifier}]_{timestamp}.{extension}`
pub fn timestamped_filename(
    base: &str,
    qualifier: Option<&str>,
    timestamp: &str,
    extension: &str,
) -> String {
    let base = sanitize(base);
    match qualifier {
        Some(qualifier) => format!("{base}_{}_{timestamp}.{extension}", sanitize(qualifier)),
        None => format!("{base}_{timestamp}.{extension}"),
    }
}

fn sanitize(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name = compacted;
    if final_name.len() > 80 {
        final_name.truncate(80);
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
