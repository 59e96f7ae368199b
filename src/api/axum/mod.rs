mod extractor;

pub use extractor::{GuardContext, GuardRejection, Guarded};
