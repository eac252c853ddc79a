pub mod settings;
pub mod tags;
pub mod task;
pub mod temporal;
pub mod update;
