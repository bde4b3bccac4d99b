pub mod background;
pub mod clip;
pub mod consts;
pub mod detection;
pub mod error;
pub mod filters;
pub mod flow;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod preview;
pub mod scheduler;
pub mod stack;
pub mod store;
pub mod track;
