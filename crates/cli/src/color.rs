// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat name color validation.
//!
//! A color is either one of the named CSS colors in [`PALETTE`] or a 3/6 digit
//! hex code that passes a readability check.
//!
//! The readability check compares the integer channel sum (0..=765) against
//! a fractional threshold of 0.7, so it only rejects pure black and colors
//! whose blue share is 70% or more. It is almost certainly not the luminance
//! check that was intended. It is kept literally so that the client and
//! server agree on which colors are valid; changing it needs product sign-off.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Named colors accepted as-is. Lowercase, so input only needs one
/// `to_lowercase` before comparison.
pub const PALETTE: &[&str] = &[
    "aliceblue",
    "antiquewhite",
    "aqua",
    "aquamarine",
    "azure",
    "beige",
    "bisque",
    "blanchedalmond",
    "burlywood",
    "cadetblue",
    "chartreuse",
    "chocolate",
    "coral",
    "cornflowerblue",
    "cornsilk",
    "cyan",
    "darkcyan",
    "darkgoldenrod",
    "darkgray",
    "darkkhaki",
    "darkorange",
    "darksalmon",
    "darkseagreen",
    "darkturquoise",
    "deeppink",
    "deepskyblue",
    "dodgerblue",
    "floralwhite",
    "fuchsia",
    "gainsboro",
    "ghostwhite",
    "gold",
    "goldenrod",
    "gray",
    "greenyellow",
    "honeydew",
    "hotpink",
    "ivory",
    "khaki",
    "lavender",
    "lavenderblush",
    "lawngreen",
    "lemonchiffon",
    "lightblue",
    "lightcoral",
    "lightcyan",
    "lightgoldenrodyellow",
    "lightgreen",
    "lightgrey",
    "lightpink",
    "lightsalmon",
    "lightseagreen",
    "lightskyblue",
    "lightslategray",
    "lightsteelblue",
    "lightyellow",
    "lime",
    "limegreen",
    "linen",
    "magenta",
    "mediumaquamarine",
    "mediumorchid",
    "mediumpurple",
    "mediumseagreen",
    "mediumslateblue",
    "mediumspringgreen",
    "mediumturquoise",
    "mintcream",
    "mistyrose",
    "moccasin",
    "navajowhite",
    "oldlace",
    "olive",
    "olivedrab",
    "orange",
    "orangered",
    "orchid",
    "palegoldenrod",
    "palegreen",
    "paleturquoise",
    "palevioletred",
    "papayawhip",
    "peachpuff",
    "peru",
    "pink",
    "plum",
    "powderblue",
    "red",
    "rosybrown",
    "salmon",
    "sandybrown",
    "seagreen",
    "seashell",
    "silver",
    "skyblue",
    "slategray",
    "snow",
    "springgreen",
    "steelblue",
    "tan",
    "thistle",
    "tomato",
    "turquoise",
    "violet",
    "wheat",
    "white",
    "whitesmoke",
    "yellow",
    "yellowgreen",
];

static HEX_COLOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{3}){1,2}$").ok());

/// Whether `token` is an acceptable chat color.
pub fn is_valid_color(token: &str) -> bool {
    let lower = token.to_lowercase();
    let s = lower.trim_start_matches('#');
    if PALETTE.contains(&s) {
        return true;
    }

    let is_hex = HEX_COLOR.as_ref().is_some_and(|re| re.is_match(s));
    if !is_hex {
        return false;
    }
    let Some((r, g, b)) = hex_channels(s) else {
        return false;
    };

    // Integer sum against a fractional threshold. See module docs.
    let total = (r + g + b) as f32;
    total > 0.7 && (b as f32) / total < 0.7
}

/// Pick a random `#rrggbb` color that passes [`is_valid_color`].
pub fn random_color() -> String {
    let mut rng = rand::rng();
    loop {
        let color = format!(
            "{:02x}{:02x}{:02x}",
            rng.random_range(0..255u32),
            rng.random_range(0..255u32),
            rng.random_range(0..255u32)
        );
        if is_valid_color(&color) {
            return format!("#{color}");
        }
    }
}

/// Decode `rgb` or `rrggbb` (no `#`) into integer channels.
pub(crate) fn hex_channels(s: &str) -> Option<(u32, u32, u32)> {
    let six = match s.len() {
        3 => s.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => s.to_owned(),
        _ => return None,
    };
    if !six.is_ascii() {
        return None;
    }
    let channel = |i: usize| u32::from_str_radix(&six[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
