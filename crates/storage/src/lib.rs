//! `ClickHouse` persistence for cosmoscope: row models, table schemas and the
//! writer/reader split used by the sync engine.

pub mod batch;
pub mod models;
pub mod reader;
pub mod schema;
pub mod writer;

pub use batch::HeightBatch;
pub use models::{
    AnalyticsRow, BlockRow, ChainStatusRow, EvidenceRow, PowerChange, PowerDistributionRow,
    PowerEventRow, TransactionRow, ValidatorRecordRow, ValidatorRow, ValidatorSetRow,
};
pub use reader::ClickhouseReader;
pub use writer::ClickhouseWriter;
