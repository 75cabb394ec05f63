pub mod department_ops;
pub mod report;
pub mod stats_ops;
pub mod tree_ops;
pub mod view_ops;
