pub mod event;
pub mod order;
pub mod product;
pub mod table;

pub use event::{ClassifiedEvents, Event, EventInput, EventPatch, EventPhase, EventWindow, NewEvent};
pub use order::{Order, OrderItem, OrderStatus, OrderWithItems};
pub use product::{Product, ProductInput};
pub use table::Table;
