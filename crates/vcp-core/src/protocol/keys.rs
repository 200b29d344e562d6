//! Parameter key normalization

/// Canonical key carrying the tool name
pub const TOOL_NAME_KEY: &str = "tool_name";

/// Canonical key carrying the fire-and-forget flag
pub const FIRE_AND_FORGET_KEY: &str = "fire_and_forget";

/// Sentinel value that also enables fire-and-forget
pub const NO_REPLY_SENTINEL: &str = "no_reply";

/// Keys that control the call instead of being passed to the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedKey {
    ToolName,
    FireAndForget,
}

impl ReservedKey {
    /// Recognize a reserved key from its normalized form
    ///
    /// Matching ignores separators, so `toolName`, `tool-name` and `TOOLNAME`
    /// all resolve to the same key.
    pub fn classify(normalized: &str) -> Option<Self> {
        let compact: String = normalized.chars().filter(|c| *c != '_').collect();
        match compact.as_str() {
            "toolname" | "tool" | "toolid" | "pluginname" => Some(Self::ToolName),
            "fireandforget" | "archery" => Some(Self::FireAndForget),
            _ => None,
        }
    }

    pub fn canonical(&self) -> &'static str {
        match self {
            Self::ToolName => TOOL_NAME_KEY,
            Self::FireAndForget => FIRE_AND_FORGET_KEY,
        }
    }
}

/// Normalize a raw key to lowercase snake case
///
/// Word boundaries are any non-alphanumeric character, a lower-to-upper case
/// change (`toolName`) and the end of an acronym (`HTTPServer`). The result is
/// a fixed point: normalizing it again returns it unchanged.
pub fn normalize_key(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            flush(&mut words, &mut current);
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                flush(&mut words, &mut current);
            }
        }

        current.extend(c.to_lowercase());
    }
    flush(&mut words, &mut current);

    words.join("_")
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

/// Interpret a fire-and-forget value
pub fn is_fire_and_forget_value(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case(NO_REPLY_SENTINEL)
}
