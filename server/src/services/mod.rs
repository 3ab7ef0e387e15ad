pub mod events;
pub mod orders;
pub mod reconciler;
pub mod reports;

pub use events::EventService;
pub use orders::OrderService;
pub use reconciler::{ReconcileReport, Reconciler};
