use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// Only pending orders can be decided, and only into a terminal status.
    pub fn decide(self, next: OrderStatus) -> Result<OrderStatus, AppError> {
        match (self, next) {
            (OrderStatus::Pending, OrderStatus::Accepted | OrderStatus::Rejected) => Ok(next),
            (OrderStatus::Pending, OrderStatus::Pending) => Err(AppError::ValidationError(
                "An order cannot be moved back to pending".to_string(),
            )),
            (current, _) => Err(AppError::Conflict(format!(
                "Order has already been {}",
                current
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order status '{0}'")]
pub struct UnknownOrderStatus(String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownOrderStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub table_id: Uuid,
    pub table_number: i32,
    pub event_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub discounted_price_at_order: Decimal,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.discounted_price_at_order
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let total = items.iter().map(OrderItem::subtotal).sum();
        Self {
            order,
            items,
            total,
        }
    }

    /// Attach line items to their orders, keeping the order sequence.
    pub fn assemble(orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<Self> {
        let mut items = items;
        orders
            .into_iter()
            .map(|order| {
                let (own, rest): (Vec<_>, Vec<_>) =
                    items.drain(..).partition(|item| item.order_id == order.id);
                items = rest;
                Self::new(order, own)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            table_id: Uuid::new_v4(),
            table_number: 4,
            event_id: Uuid::new_v4(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(order_id: Uuid, quantity: i32, cents: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id: Uuid::new_v4(),
            product_name: "Beer".to_string(),
            quantity,
            discounted_price_at_order: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_pending_can_be_decided() {
        assert_eq!(
            OrderStatus::Pending.decide(OrderStatus::Accepted).unwrap(),
            OrderStatus::Accepted
        );
        assert_eq!(
            OrderStatus::Pending.decide(OrderStatus::Rejected).unwrap(),
            OrderStatus::Rejected
        );
    }

    #[test]
    fn test_decided_orders_are_terminal() {
        assert!(matches!(
            OrderStatus::Accepted.decide(OrderStatus::Rejected),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            OrderStatus::Rejected.decide(OrderStatus::Accepted),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            OrderStatus::Pending.decide(OrderStatus::Pending),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_status_parses_from_column_text() {
        assert_eq!("accepted".parse::<OrderStatus>().unwrap(), OrderStatus::Accepted);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_assemble_groups_items_and_totals() {
        let first = order(OrderStatus::Accepted);
        let second = order(OrderStatus::Rejected);
        let items = vec![
            item(first.id, 2, 350),
            item(second.id, 1, 1000),
            item(first.id, 1, 150),
        ];

        let assembled = OrderWithItems::assemble(vec![first.clone(), second.clone()], items);
        assert_eq!(assembled.len(), 2);
        assert_eq!(assembled[0].order.id, first.id);
        assert_eq!(assembled[0].items.len(), 2);
        assert_eq!(assembled[0].total, Decimal::new(850, 2));
        assert_eq!(assembled[1].total, Decimal::new(1000, 2));
    }
}
