use anyhow::Result;

use crate::ranking::RankedCombination;

pub fn combinations_to_csv(combinations: &[RankedCombination]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "rank",
        "num_suppliers",
        "grand_total",
        "total_medicine_cost",
        "total_delivery_cost",
        "supplier_id",
        "supplier_name",
        "supplier_delivery_cost",
        "item",
        "brand",
        "price",
    ])?;
    for c in combinations {
        for s in &c.suppliers {
            if s.items.is_empty() {
                writer.write_record([
                    c.rank.to_string(),
                    c.num_suppliers.to_string(),
                    format!("{:.2}", c.grand_total),
                    format!("{:.2}", c.total_medicine_cost),
                    format!("{:.2}", c.total_delivery_cost),
                    s.supplier_id.clone(),
                    s.supplier_name.clone(),
                    format!("{:.2}", s.delivery_cost),
                    String::new(),
                    String::new(),
                    String::new(),
                ])?;
            }
            for item in &s.items {
                writer.write_record([
                    c.rank.to_string(),
                    c.num_suppliers.to_string(),
                    format!("{:.2}", c.grand_total),
                    format!("{:.2}", c.total_medicine_cost),
                    format!("{:.2}", c.total_delivery_cost),
                    s.supplier_id.clone(),
                    s.supplier_name.clone(),
                    format!("{:.2}", s.delivery_cost),
                    item.item.clone(),
                    item.brand.clone(),
                    format!("{:.2}", item.price),
                ])?;
            }
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
