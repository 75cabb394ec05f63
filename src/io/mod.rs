pub mod lock;
pub mod settings_io;
pub mod state;
pub mod store_io;
