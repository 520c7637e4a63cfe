//! Pure derived views over a bill scan: per-customer aggregates and the
//! inventory/sale tree merge.

use crate::models::{Bill, CustomerSummary, SaleInfo, Tree, TreeStatus, TreeView};
use std::collections::{BTreeMap, HashMap};

/// Fold all bills into per-customer aggregates.
///
/// The first-seen bill supplies the display name and phone; output order is
/// first-seen order of each `customer_id`, which keeps the customer page
/// stable across requests.
pub fn summarize_customers(bills: &[Bill]) -> Vec<CustomerSummary> {
    let mut summaries: Vec<CustomerSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for bill in bills {
        match index.get(bill.customer_id.as_str()) {
            Some(&at) => {
                let entry = &mut summaries[at];
                entry.total_bills += 1;
                entry.total_balance += bill.balance;
            }
            None => {
                index.insert(bill.customer_id.as_str(), summaries.len());
                summaries.push(CustomerSummary {
                    customer_id: bill.customer_id.clone(),
                    customer_name: bill.customer_name.clone(),
                    phone: bill.phone.clone(),
                    total_bills: 1,
                    total_balance: bill.balance,
                });
            }
        }
    }

    summaries
}

/// Merge inventory trees with bill-derived sale state.
///
/// A tree is sold exactly when some bill references its `tree_id`; a bill
/// whose `tree_id` has no inventory record produces a synthetic entry with
/// the bill's measurement as its size. When several bills reference one
/// tree, the bill with the latest creation time supplies the sale fields.
/// Result is ascending by `tree_id`.
pub fn merge_tree_views(inventory: Vec<Tree>, bills: &[Bill]) -> Vec<TreeView> {
    let mut merged: BTreeMap<String, TreeView> = BTreeMap::new();

    for tree in &inventory {
        merged
            .entry(tree.tree_id.clone())
            .or_insert_with(|| TreeView::from_inventory(tree));
    }

    for bill in bills {
        let sale = SaleInfo {
            customer_name: bill.customer_name.clone(),
            bill_id: bill.bill_id.clone(),
            amount: bill.total_amount,
            bill_date: bill.created_at,
        };

        let entry = merged
            .entry(bill.tree_id.clone())
            .or_insert_with(|| TreeView {
                tree_id: bill.tree_id.clone(),
                size: bill.tree_measurement.clone(),
                description: None,
                status: TreeStatus::Sold,
                sale: None,
            });

        entry.status = TreeStatus::Sold;
        let newer = entry
            .sale
            .as_ref()
            .map_or(true, |current| sale.bill_date >= current.bill_date);
        if newer {
            entry.sale = Some(sale);
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillInput, BillStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn bill(customer_id: &str, tree_id: &str, total: f64, paid: f64) -> Bill {
        let mut bill = Bill::new(BillInput {
            customer_id: customer_id.to_string(),
            customer_name: format!("name-{customer_id}"),
            phone: None,
            tree_id: tree_id.to_string(),
            tree_measurement: "10ft".to_string(),
            tree_quantity: 1,
            total_amount: total,
            amount_paid: paid,
        });
        bill.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        bill
    }

    fn inventory_tree(tree_id: &str) -> Tree {
        Tree::new(crate::models::TreeInput {
            tree_id: tree_id.to_string(),
            size: "12ft".to_string(),
            description: "teak".to_string(),
        })
    }

    #[test]
    fn customer_summary_counts_and_balances() {
        let bills = vec![
            bill("C1", "T1", 100.0, 40.0),
            bill("C2", "T2", 50.0, 50.0),
            bill("C1", "T3", 200.0, 0.0),
        ];

        let summaries = summarize_customers(&bills);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].customer_id, "C1");
        assert_eq!(summaries[0].total_bills, 2);
        assert_eq!(summaries[0].total_balance, 260.0);

        assert_eq!(summaries[1].customer_id, "C2");
        assert_eq!(summaries[1].total_bills, 1);
        assert_eq!(summaries[1].total_balance, 0.0);
    }

    #[test]
    fn customer_summary_keeps_first_seen_identity_and_order() {
        let mut first = bill("C1", "T1", 10.0, 0.0);
        first.phone = Some("111".to_string());
        let mut second = bill("C1", "T2", 10.0, 0.0);
        second.customer_name = "renamed".to_string();
        second.phone = Some("222".to_string());

        let summaries = summarize_customers(&[bill("C9", "T0", 1.0, 1.0), first, second]);
        assert_eq!(summaries[0].customer_id, "C9");
        assert_eq!(summaries[1].customer_name, "name-C1");
        assert_eq!(summaries[1].phone.as_deref(), Some("111"));
    }

    #[test]
    fn empty_scan_yields_no_customers() {
        assert!(summarize_customers(&[]).is_empty());
    }

    #[test]
    fn billed_trees_are_sold_and_unbilled_stay_available() {
        let inventory = vec![inventory_tree("T1"), inventory_tree("T2")];
        let bills = vec![bill("C1", "T1", 100.0, 0.0)];

        let views = merge_tree_views(inventory, &bills);
        assert_eq!(views.len(), 2);

        let t1 = views.iter().find(|v| v.tree_id == "T1").unwrap();
        assert_eq!(t1.status, TreeStatus::Sold);
        assert_eq!(t1.sale.as_ref().unwrap().customer_name, "name-C1");
        // Inventory fields survive the merge.
        assert_eq!(t1.size, "12ft");
        assert_eq!(t1.description.as_deref(), Some("teak"));

        let t2 = views.iter().find(|v| v.tree_id == "T2").unwrap();
        assert_eq!(t2.status, TreeStatus::Available);
        assert!(t2.sale.is_none());
    }

    #[test]
    fn bill_without_inventory_record_synthesizes_a_sold_tree() {
        let views = merge_tree_views(vec![], &[bill("C1", "T9", 75.0, 75.0)]);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].tree_id, "T9");
        assert_eq!(views[0].size, "10ft");
        assert_eq!(views[0].status, TreeStatus::Sold);
        assert!(views[0].description.is_none());
    }

    #[test]
    fn latest_bill_wins_the_sale_fields() {
        let older = bill("C1", "T1", 100.0, 0.0);
        let mut newer = bill("C2", "T1", 300.0, 0.0);
        newer.created_at = older.created_at + Duration::hours(1);

        // Scan order must not matter.
        for bills in [vec![older.clone(), newer.clone()], vec![newer.clone(), older.clone()]] {
            let views = merge_tree_views(vec![inventory_tree("T1")], &bills);
            let sale = views[0].sale.as_ref().unwrap();
            assert_eq!(sale.customer_name, "name-C2");
            assert_eq!(sale.amount, 300.0);
        }
    }

    #[test]
    fn merge_sorts_ascending_by_tree_id() {
        let views = merge_tree_views(
            vec![inventory_tree("T20"), inventory_tree("T03")],
            &[bill("C1", "T10", 5.0, 5.0)],
        );
        let ids: Vec<_> = views.iter().map(|v| v.tree_id.as_str()).collect();
        assert_eq!(ids, vec!["T03", "T10", "T20"]);
    }

    #[test]
    fn bill_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(BillStatus::Active).unwrap(),
            serde_json::json!("active")
        );
    }
}
