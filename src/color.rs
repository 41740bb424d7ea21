//! `<font color>` parsing.

const NAMED_COLORS: [(&str, u32); 23] = [
    ("black", 0xFF00_0000),
    ("darkgray", 0xFF44_4444),
    ("gray", 0xFF88_8888),
    ("lightgray", 0xFFCC_CCCC),
    ("white", 0xFFFF_FFFF),
    ("red", 0xFFFF_0000),
    ("green", 0xFF00_FF00),
    ("blue", 0xFF00_00FF),
    ("yellow", 0xFFFF_FF00),
    ("cyan", 0xFF00_FFFF),
    ("magenta", 0xFFFF_00FF),
    ("aqua", 0xFF00_FFFF),
    ("fuchsia", 0xFFFF_00FF),
    ("darkgrey", 0xFF44_4444),
    ("grey", 0xFF88_8888),
    ("lightgrey", 0xFFCC_CCCC),
    ("lime", 0xFF00_FF00),
    ("maroon", 0xFF80_0000),
    ("navy", 0xFF00_0080),
    ("olive", 0xFF80_8000),
    ("purple", 0xFF80_0080),
    ("silver", 0xFFC0_C0C0),
    ("teal", 0xFF00_8080),
];

/// Parse `#RRGGBB`, `#AARRGGBB` or a colour name into ARGB.
///
/// Names match ASCII case-insensitively. `#RRGGBB` is returned opaque.
pub fn parse_color(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix('#') {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let rgb = u32::from_str_radix(hex, 16).ok()?;
        return match hex.len() {
            6 => Some(rgb | 0xFF00_0000),
            8 => Some(rgb),
            _ => None,
        };
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, argb)| *argb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_color("#ff0000"), Some(0xFFFF_0000));
        assert_eq!(parse_color("#80123456"), Some(0x8012_3456));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(parse_color("Red"), Some(0xFFFF_0000));
        assert_eq!(parse_color("WHITE"), Some(0xFFFF_FFFF));
        assert_eq!(parse_color("teal"), Some(0xFF00_8080));
        assert_eq!(parse_color("chartreuse"), None);
        assert_eq!(parse_color(""), None);
    }
}
