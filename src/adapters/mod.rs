//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements | Connects to                 |
//! |-----------------|------------|-----------------------------|
//! | `log_sink`      | EventSink  | `log` facade                |
//! | `memory_config` | ConfigPort | in-memory postcard blob     |
//! | `json_config`   | ConfigPort | JSON file on disk           |

pub mod json_config;
pub mod log_sink;
pub mod memory_config;

pub use json_config::JsonConfigFile;
pub use log_sink::LogEventSink;
pub use memory_config::MemoryConfigStore;
