//! Shopping list built from the recipes in a user's cart.

use std::collections::HashMap;

pub const HEADER: &str = "Shopping list:";
pub const FILENAME: &str = "shopping_cart.txt";

/// One ingredient row of a recipe in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Sums amounts per (name, unit), ordered by name descending then unit.
pub fn aggregate(rows: impl IntoIterator<Item = CartRow>) -> Vec<ShoppingLine> {
    let mut totals: HashMap<(String, String), i64> = HashMap::new();
    for row in rows {
        *totals.entry((row.name, row.measurement_unit)).or_default() += row.amount;
    }
    let mut lines: Vec<ShoppingLine> = totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingLine {
            name,
            measurement_unit,
            total,
        })
        .collect();
    lines.sort_by(|a, b| {
        b.name
            .cmp(&a.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    });
    lines
}

pub fn render(lines: &[ShoppingLine]) -> String {
    let body: Vec<String> = lines
        .iter()
        .map(|l| format!("{} — {} {}", l.name, l.total, l.measurement_unit))
        .collect();
    format!("{HEADER}\n\n{}", body.join("\n"))
}
