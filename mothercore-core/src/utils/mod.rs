pub mod clock;
pub mod logbook;

pub use logbook::{RecordStore, Records};
