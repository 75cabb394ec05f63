pub mod dashboard;
pub mod forest;
pub mod settings;
pub mod task;

pub use dashboard::*;
pub use forest::*;
pub use settings::*;
pub use task::*;
