//! Order lifecycle core: transactional store, inventory ledger, order book,
//! payment and shipment recording, the workflow that ties them together, and
//! read views for presentation.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod orders;
pub mod payments;
pub mod read_model;
pub mod shipments;
pub mod store;
pub mod workflow;


pub use catalog::Catalog;
pub use config::{ConfigError, PostgresConfig, StoreConfig};
pub use error::{EntityKind, WorkflowError, WorkflowResult};
pub use ledger::{InventoryLedger, Reservation};
pub use orders::{OrderBook, OrderRecord, OrderRemoval};
pub use payments::{PaymentRecorder, RecordedPayment};
pub use read_model::{
    CustomerRow, CustomerSummary, DashboardStats, ListingFilter, OrderRow, PaymentRow,
    ReadViews, ShipmentRow, StatusCount,
};
pub use shipments::{RecordedShipment, ShipmentRecorder};
pub use store::{
    FaultPoint, InMemoryStore, InMemoryTransaction, PostgresStore, PostgresTransaction, Store,
    StoreError, StoreTransaction,
};
pub use workflow::{LineUpdate, NewOrder, OrderWorkflow};
