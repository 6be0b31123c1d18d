pub mod issue;
pub mod row;
pub mod search;

pub use issue::*;
pub use row::*;
pub use search::*;
