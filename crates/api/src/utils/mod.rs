pub mod logging;
pub mod return_to;
