//! Wire rendering configuration.

/// Environment variable consulted when no explicit style is given.
pub const WIRE_STYLE_ENV: &str = "FAUNA_QUERY_WIRE_STYLE";

/// How [`crate::codec::to_wire_string`] lays out the JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireStyle {
    /// Single line, no insignificant whitespace.
    #[default]
    Compact,
    /// Indented, one field per line. Useful when logging queries.
    Pretty,
}

impl WireStyle {
    /// Parse a style name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(WireStyle::Compact),
            "pretty" => Some(WireStyle::Pretty),
            _ => None,
        }
    }
}

/// Resolve the wire style.
///
/// An explicit value wins, then `FAUNA_QUERY_WIRE_STYLE`, then
/// [`WireStyle::Compact`]. Unrecognized names fall through to the next source.
pub fn resolve_wire_style(explicit: Option<&str>) -> WireStyle {
    if let Some(style) = explicit.and_then(WireStyle::parse) {
        return style;
    }

    if let Ok(env_style) = std::env::var(WIRE_STYLE_ENV) {
        match WireStyle::parse(&env_style) {
            Some(style) => return style,
            None => tracing::warn!("Ignoring unknown {WIRE_STYLE_ENV} value: {env_style}"),
        }
    }

    WireStyle::default()
}
