//! Dataset loading, encoding and partitioning
//!
//! Raw categorical CSV is read through a [`DataSource`](crate::core::DataSource),
//! checked against a [`DatasetSchema`], encoded column by column and finally
//! split into training and test sides.

pub mod csv;
pub mod encoder;
pub mod schema;
pub mod source;
pub mod split;

pub use self::csv::{load_data, CategoricalTable};
pub use self::encoder::{ColumnEncoder, EncodedColumn, EncodedDataset};
pub use self::schema::{DatasetSchema, LABEL_COLUMN, MUSHROOM_FEATURES};
pub use self::source::{content_fingerprint, FileSource, InMemorySource};
pub use self::split::split;
