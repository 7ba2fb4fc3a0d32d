//! External collaborators of the delivery backend.
//!
//! - [`storage`]: time-limited retrieval URLs for opaque storage keys
//!   (S3 presigning or a static base URL).
//! - [`model`]: the data model client (asset records scoped by
//!   organization and project), with a GraphQL and an in-memory backend.
//!
//! Both are injected as trait objects; nothing here is a global.

pub mod error;
pub mod graphql;
pub mod model;
pub mod storage;

pub use error::CloudError;
pub use graphql::GraphqlModelClient;
pub use model::{AssetPatch, AssetRecord, DataModelClient, InMemoryModelClient, NewAsset, Scope};
pub use storage::{ObjectStorage, S3ObjectStorage, StaticObjectStorage};
