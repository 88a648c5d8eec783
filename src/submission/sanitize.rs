use std::sync::LazyLock;

use regex::Regex;

static ANGLE_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[<>]").unwrap());

static JS_PROTOCOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript:").unwrap());

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on[a-z0-9_]+=").unwrap());

/// Strip naive markup and script injection from free text.
///
/// Denylist only: removes `<` and `>`, `javascript:` and `on<word>=`
/// (case-insensitive), then trims. Passes repeat until nothing changes, so
/// fragments like `javajavascript:script:` cannot reassemble and the result
/// is idempotent. Rendered output still needs escaping.
pub fn sanitize_text(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_once(input: &str) -> String {
    let s = ANGLE_BRACKETS.replace_all(input, "");
    let s = JS_PROTOCOL.replace_all(&s, "");
    let s = EVENT_HANDLER.replace_all(&s, "");
    s.trim().to_string()
}
