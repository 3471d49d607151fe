/// Placeholder shown in place of payloads that cannot be displayed as text.
pub const NON_PRINTABLE: &str = "non-printable bytes";

/// Renders raw task bytes for display.
///
/// `type_hint` is the task type name, so implementations can decode
/// payloads per task kind. Closures `Fn(&str, &[u8]) -> String` implement it too.
pub trait PayloadFormatter: Send + Sync + 'static {
    fn format(&self, type_hint: &str, bytes: &[u8]) -> String;
}

impl<F> PayloadFormatter for F
where
    F: Fn(&str, &[u8]) -> String + Send + Sync + 'static,
{
    fn format(&self, type_hint: &str, bytes: &[u8]) -> String {
        self(type_hint, bytes)
    }
}

/// Passes printable UTF-8 through and replaces everything else with [`NON_PRINTABLE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl PayloadFormatter for DefaultFormatter {
    fn format(&self, _type_hint: &str, bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(s) if is_printable(s) => s.to_string(),
            _ => NON_PRINTABLE.to_string(),
        }
    }
}

/// All characters printable (plain space allowed, other whitespace not) and not all blank.
fn is_printable(s: &str) -> bool {
    let mut all_space = true;
    for c in s.chars() {
        if c == ' ' {
            continue;
        }
        if c.is_control() || c.is_whitespace() {
            return false;
        }
        all_space = false;
    }
    !all_space
}
