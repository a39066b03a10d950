//! Display formatting for item names and prices.

/// Title-case an item key for display: separators become spaces and every
/// word is capitalized. `diamond_sword` → `Diamond Sword`.
pub fn format_item_name(key: &str) -> String {
    key.replace(['_', '-'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The two price conventions in use. Market-API prices carry a decimal and
/// the `$` marker; in-game currency amounts are whole Coins. Both group
/// thousands with `.` and (where present) use `,` as the decimal comma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFormat {
    /// One-decimal rounding with a `$` suffix: `1.234.567,8 $`.
    GroupedDecimal,
    /// Integer rounding with a `Coins` suffix: `1.234.567 Coins`.
    GroupedInteger,
}

impl PriceFormat {
    pub fn format(self, price: f64) -> String {
        match self {
            PriceFormat::GroupedDecimal => {
                // Round to one decimal first so 999.96 carries into 1.000,0.
                let rounded = (price * 10.0).round() / 10.0;
                let whole = rounded.trunc() as u64;
                let tenth = ((rounded - rounded.trunc()) * 10.0).round() as u64;
                format!("{},{tenth} $", group_thousands(whole))
            }
            PriceFormat::GroupedInteger => {
                format!("{} Coins", group_thousands(price.round() as u64))
            }
        }
    }
}

/// `1234567` → `1.234.567`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_names_are_title_cased() {
        assert_eq!(format_item_name("diamond_sword"), "Diamond Sword");
        assert_eq!(format_item_name("netherite_upgrade_smithing_template"),
            "Netherite Upgrade Smithing Template");
        assert_eq!(format_item_name("stone"), "Stone");
    }

    #[test]
    fn grouped_decimal_formatting() {
        assert_eq!(PriceFormat::GroupedDecimal.format(1_234_567.8), "1.234.567,8 $");
        assert_eq!(PriceFormat::GroupedDecimal.format(0.5), "0,5 $");
        assert_eq!(PriceFormat::GroupedDecimal.format(1000.0), "1.000,0 $");
    }

    #[test]
    fn grouped_decimal_rounds_to_one_place() {
        assert_eq!(PriceFormat::GroupedDecimal.format(999.96), "1.000,0 $");
        assert_eq!(PriceFormat::GroupedDecimal.format(12.34), "12,3 $");
    }

    #[test]
    fn grouped_integer_formatting() {
        assert_eq!(PriceFormat::GroupedInteger.format(1_234_567.0), "1.234.567 Coins");
        assert_eq!(PriceFormat::GroupedInteger.format(999.6), "1.000 Coins");
        assert_eq!(PriceFormat::GroupedInteger.format(42.0), "42 Coins");
    }

    #[test]
    fn small_values_are_not_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1.000");
        assert_eq!(group_thousands(12_345_678), "12.345.678");
    }
}
