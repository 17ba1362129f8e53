//! Daily video task: quota status, view recording and the trailer catalog
//! served through the same-origin proxy.

pub mod client;
pub mod types;
