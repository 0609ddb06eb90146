//! Business logic services for the print shop back office

pub mod production_consumption;
pub mod purchase_order;
pub mod purchase_receiving;
pub mod stock_item;
pub mod stock_ledger;
pub mod ticket;

pub use production_consumption::ProductionConsumptionService;
pub use purchase_order::PurchaseOrderService;
pub use purchase_receiving::PurchaseReceivingService;
pub use stock_item::StockItemService;
pub use stock_ledger::StockLedgerService;
pub use ticket::TicketService;
