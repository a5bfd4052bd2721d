
mod enumerate_ops;
mod metadata_ops;
mod open_modes;
mod watch_ops;
