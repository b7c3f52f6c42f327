//! Fixed names shared across the build orchestrator.

/// Prefix that turns a step token into its anti-step.
pub const ANTI_STEP_PREFIX: &str = "~";

// Runtime (Node.js) sub-build layout, relative to the project root.
pub const NODE_DIR: &str = "node";
pub const NODE_OUT_SUBDIR: &str = "out";
pub const NODE_EXTRA_SUBDIRS: [&str; 3] = ["build", "Release", "Debug"];
pub const NODE_CACHE_DIR: &str = "node.out";
pub const NODE_TAG_FILE: &str = "j2v8.node.out";
/// Cache entry for live output found without a tag marker.
pub const NODE_UNTAGGED_ENTRY: &str = "untagged";

/// Native build output directory, relative to the build working directory.
pub const CMAKE_OUT_DIR: &str = "./cmake.out/$VENDOR-$PLATFORM.$ARCH/";

pub const JAVA_BUILD_CMD: &str = "mvn clean verify -e --batch-mode -DskipTests";
pub const JAVA_TESTS_CMD: &str = "mvn test -e --batch-mode";

pub const DEFAULT_NODE_VERSION: &str = "7.4.0";
pub const DEFAULT_J2V8_VERSION: &str = "4.8.0";
pub const J2V8_VERSION_SUFFIX: &str = "-SNAPSHOT";

/// Command that re-invokes the orchestrator inside a sandbox.
pub const DEFAULT_AGENT_COMMAND: &str = "cargo run --quiet --release --bin j2v8-build --";

// Environment variables read by `Settings::from_env`.
pub const ENV_BUILD_ROOT: &str = "J2V8_BUILD_ROOT";
pub const ENV_AGENT_COMMAND: &str = "J2V8_BUILD_AGENT_COMMAND";
pub const ENV_NODE_VERSION: &str = "J2V8_NODE_VERSION";
pub const ENV_J2V8_VERSION: &str = "J2V8_VERSION";

pub const VENDOR_ALPINE: &str = "alpine";
pub const VENDOR_DEBIAN: &str = "debian";
