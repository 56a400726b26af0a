/// Name of the environment variable containing the path to the admissibility
/// configuration file. If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/hyperion/admissibility.toml` or `$HOME/.config/hyperion/admissibility.toml`
///  (2) on Windows: `%APPDATA%\hyperion\admissibility.toml`
pub const ENV_CONFIG_PATH: &str = "HYADMIT_CONFIG_PATH";

/// Directory shared with the other hyperion tools.
pub const CONFIG_DIR_NAME: &str = "hyperion";

/// File name of the admissibility configuration.
pub const CONFIG_FILE_NAME: &str = "admissibility.toml";
