use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::cost::fee::FeeQuote;
use crate::ranking::RankedCombination;

pub fn render_combinations_table(combinations: &[RankedCombination]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Rank",
        "Shops",
        "Medicines",
        "Delivery",
        "Grand Total",
        "Fulfilment",
    ]);

    for c in combinations {
        let rank_cell = if c.rank == 1 {
            Cell::new(c.rank).fg(Color::Green)
        } else {
            Cell::new(c.rank)
        };
        let fulfilment = c
            .suppliers
            .iter()
            .map(|s| {
                let items = s
                    .items
                    .iter()
                    .map(|i| format!("{} ({}) {:.2}", i.item, i.brand, i.price))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} [{:.2} delivery]: {}", s.supplier_name, s.delivery_cost, items)
            })
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(Row::from(vec![
            rank_cell,
            Cell::new(c.num_suppliers),
            Cell::new(format!("{:.2}", c.total_medicine_cost)),
            Cell::new(format!("{:.2}", c.total_delivery_cost)),
            Cell::new(format!("{:.2}", c.grand_total)),
            Cell::new(fulfilment),
        ]));
    }

    let mut out = table.to_string();
    if let Some(best) = combinations.first() {
        out.push_str(&format!("\nPriority: {}", best.priority_reason));
    }
    out
}

pub fn render_quote_table(quote: &FeeQuote) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Component", "Amount"]);
    let b = &quote.breakdown;
    table.add_row(vec![
        "Small-order surcharge".to_string(),
        format!("{:.2}", b.small_order_surcharge),
    ]);
    table.add_row(vec!["Distance fee".to_string(), format!("{:.2}", b.distance_fee)]);
    table.add_row(vec!["Item surcharge".to_string(), format!("{:.2}", b.item_surcharge)]);
    table.add_row(vec![
        "Total".to_string(),
        format!("{:.2} {}", quote.total_fee, quote.currency),
    ]);

    let mut out = table.to_string();
    if b.free_delivery_applied {
        out.push_str("\nFree delivery applied");
    } else if b.capped {
        out.push_str("\nFee capped");
    }
    out
}
