use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{OrderItem, OrderStatus, OrderWithItems};

/// Accepted revenue for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableFinance {
    pub table_id: Uuid,
    pub table_number: i32,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventFinances {
    pub event_id: Uuid,
    pub tables: Vec<TableFinance>,
    pub total: Decimal,
}

/// Group accepted orders by table, ordered by table number. Orders in any
/// other status are ignored.
pub fn event_finances(event_id: Uuid, orders: &[OrderWithItems]) -> EventFinances {
    let mut by_table: BTreeMap<(i32, Uuid), TableFinance> = BTreeMap::new();

    for entry in orders
        .iter()
        .filter(|entry| entry.order.status == OrderStatus::Accepted)
    {
        let order = &entry.order;
        let table = by_table
            .entry((order.table_number, order.table_id))
            .or_insert_with(|| TableFinance {
                table_id: order.table_id,
                table_number: order.table_number,
                items: Vec::new(),
                total: Decimal::ZERO,
            });
        for item in &entry.items {
            table.total += item.subtotal();
            table.items.push(item.clone());
        }
    }

    let tables: Vec<TableFinance> = by_table.into_values().collect();
    let total = tables.iter().map(|table| table.total).sum();
    EventFinances {
        event_id,
        tables,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Order;
    use chrono::Utc;

    fn order(
        table_number: i32,
        table_id: Uuid,
        status: OrderStatus,
        lines: &[(i32, i64)],
    ) -> OrderWithItems {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            table_id,
            table_number,
            event_id: Uuid::nil(),
            status,
            created_at: now,
            updated_at: now,
        };
        let items = lines
            .iter()
            .map(|(quantity, cents)| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: Uuid::new_v4(),
                product_name: "Wine".to_string(),
                quantity: *quantity,
                discounted_price_at_order: Decimal::new(*cents, 2),
            })
            .collect();
        OrderWithItems::new(order, items)
    }

    #[test]
    fn test_groups_accepted_orders_per_table() {
        let table_one = Uuid::new_v4();
        let table_two = Uuid::new_v4();
        let orders = vec![
            order(2, table_two, OrderStatus::Accepted, &[(1, 1200)]),
            order(1, table_one, OrderStatus::Accepted, &[(2, 450), (1, 300)]),
            order(1, table_one, OrderStatus::Rejected, &[(5, 1000)]),
            order(1, table_one, OrderStatus::Accepted, &[(1, 100)]),
        ];

        let finances = event_finances(Uuid::nil(), &orders);
        assert_eq!(finances.tables.len(), 2);
        assert_eq!(finances.tables[0].table_number, 1);
        assert_eq!(finances.tables[0].items.len(), 3);
        assert_eq!(finances.tables[0].total, Decimal::new(1300, 2));
        assert_eq!(finances.tables[1].total, Decimal::new(1200, 2));
        assert_eq!(finances.total, Decimal::new(2500, 2));
    }

    #[test]
    fn test_no_accepted_orders() {
        let orders = vec![order(3, Uuid::new_v4(), OrderStatus::Pending, &[(1, 500)])];
        let finances = event_finances(Uuid::nil(), &orders);
        assert!(finances.tables.is_empty());
        assert_eq!(finances.total, Decimal::ZERO);
    }
}
