//! Just enough XML-RPC to ask the info server for its resource pool.

/// Builds a parameterless `methodCall` document.
pub fn method_call(method: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodCall><methodName>{}</methodName><params></params></methodCall>",
        escape(method)
    )
}

/// True when the response carries a `<fault>` instead of a value.
pub fn is_fault(response: &str) -> bool {
    response.contains("<fault>")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
