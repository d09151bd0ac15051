pub mod invoice;
pub mod reference;

pub use invoice::{InvoiceRecord, LineItem};
pub use reference::ReferenceRecord;
