// Color resolution tests

use rstest::rstest;
use tilemark::watermark::{make_rgba_style, parse_hex_color, Color, FillStyle};

#[rstest]
#[case("#ff0000", 0.5, "rgba(255,0,0,0.5)")]
#[case("ff0000", 0.5, "rgba(255,0,0,0.5)")]
#[case("not-a-color", 0.5, "rgba(0,0,0,0.5)")]
#[case("#FFF", 0.3, "rgba(0,0,0,0.3)")]
#[case("#00ff7f", 1.0, "rgba(0,255,127,1)")]
fn test_make_rgba_style(#[case] hex: &str, #[case] alpha: f32, #[case] expected: &str) {
    assert_eq!(make_rgba_style(hex, alpha), expected);
}

#[test]
fn test_parse_rejects_extra_characters() {
    assert_eq!(parse_hex_color("#ff00001"), None);
    assert_eq!(parse_hex_color("##ff0000"), None);
    assert_eq!(parse_hex_color(" ff0000"), None);
    assert_eq!(parse_hex_color("#AbCdEf"), Some(Color::new(0xab, 0xcd, 0xef)));
}

#[test]
fn test_outline_style_complements_fill() {
    let fill = FillStyle::resolve("#102030", 0.5);
    let outline = fill.outline(0.2);
    assert_eq!(outline.color, Color::new(0xef, 0xdf, 0xcf));
    assert!((outline.alpha - 0.7).abs() < 1e-6);

    let capped = FillStyle::resolve("#000000", 0.95).outline(0.2);
    assert!((capped.alpha - 1.0).abs() < 1e-6);
}
