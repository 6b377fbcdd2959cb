/// A named palette color. RGB components are in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkColor {
    pub name: &'static str,
    /// The unusual metallic shade behind the simple base name.
    pub shade: &'static str,
    pub rgb: (f64, f64, f64),
}

pub const PALETTE: [MarkColor; 9] = [
    MarkColor { name: "Hvit", shade: "White", rgb: (1.0, 1.0, 1.0) },
    MarkColor { name: "Rosa", shade: "Coral", rgb: (1.0, 0.5, 0.4) },
    MarkColor { name: "Grønn", shade: "Mint", rgb: (0.4, 0.9, 0.7) },
    MarkColor { name: "Magenta", shade: "Fuchsia", rgb: (0.9, 0.2, 0.6) },
    MarkColor { name: "Gul", shade: "Gold", rgb: (0.85, 0.65, 0.2) },
    MarkColor { name: "Lilla", shade: "Lavender", rgb: (0.7, 0.5, 0.9) },
    MarkColor { name: "Blå", shade: "Petrol", rgb: (0.1, 0.5, 0.5) },
    MarkColor { name: "Oransje", shade: "Apricot", rgb: (1.0, 0.7, 0.5) },
    MarkColor { name: "Rød", shade: "Plum", rgb: (0.5, 0.2, 0.4) },
];

impl MarkColor {
    /// Looks a color up by name: exact, then case-insensitive, then with
    /// Norwegian letters folded to ASCII (`gronn`, `bla`, `rod`).
    #[must_use]
    pub fn find(name: &str) -> Option<&'static MarkColor> {
        let name = name.trim();
        PALETTE
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                let lower = name.to_lowercase();
                PALETTE.iter().find(|c| c.name.to_lowercase() == lower)
            })
            .or_else(|| {
                let folded = fold_ascii(name);
                PALETTE.iter().find(|c| fold_ascii(c.name) == folded)
            })
    }

    /// 8-bit channels, truncated like the swatches of the web form.
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn rgb8(&self) -> (u8, u8, u8) {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
        (channel(self.rgb.0), channel(self.rgb.1), channel(self.rgb.2))
    }

    #[must_use]
    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn fold_ascii(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .flat_map(|c| match c {
            'ø' => vec!['o'],
            'å' => vec!['a'],
            'æ' => vec!['a', 'e'],
            _ => vec![c],
        })
        .collect()
}
