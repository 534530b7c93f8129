//env
pub const READER_CONFIG_NOT_FOUND: &str = "Reader config not found, using defaults";
pub const LABELLER_CONFIG_NOT_FOUND: &str = "Labeller config not found";

//config
pub const CONFIG_READ_FAILED: &str = "Failed to read config";
pub const CONFIG_PARSE_FAILED: &str = "Failed to parse config";
pub const CONFIG_OVERRIDE_INVALID: &str = "Ignoring invalid config override";

//io
pub const COPY_OUTPUT_FAILED: &str = "Failed to copy output file";

//api
pub const HTTP_CLIENT_BUILD_FAILED: &str = "Failed to build HTTP client";

//run
pub const RUN_ABORTED: &str = "Run aborted";
