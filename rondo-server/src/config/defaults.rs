//! Default configuration values
//!
//! These are embedded in the binary and used when no config file exists.

/// Default configuration as TOML (for reference/documentation)
#[allow(dead_code)]
pub const DEFAULT_CONFIG_TOML: &str = r##"
# rondo configuration

[general]
# First slot index used for new windows
base_index = 0
# default_window_name = "shell"

[status]
enabled = true
width = 80

[startup]
# Command lines run inside the server when it starts
commands = []
"##;
