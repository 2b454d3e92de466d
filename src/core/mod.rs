pub mod migration;
pub mod pagination;
pub mod token;
pub mod transport;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    CollectionDescriptor, Credential, MigrationPhase, Record, TenantRole, TenantTokens, Token,
};
pub use crate::domain::ports::{CallMethod, RecordTransport, TransportResponse};
pub use crate::utils::error::Result;
