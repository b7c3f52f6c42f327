//! Commands reused by several targets.
//!
//! Everything here returns unsubstituted templates; the build system injects
//! the frozen configuration into the joined command line right before it runs.

use crate::config::StepConfig;
use crate::consts::{CMAKE_OUT_DIR, JAVA_BUILD_CMD, JAVA_TESTS_CMD, VENDOR_ALPINE};
use crate::platform::{AgentKind, Dialect, Os};
use crate::steps::Step;

pub const OUTPUT_LIB_NAME: &str = "libj2v8-$VENDOR-$PLATFORM-$FILE_ABI.$LIB_EXT";
pub const OUTPUT_JAR_NAME: &str = "j2v8_$VENDOR-$PLATFORM_$FILE_ABI-$J2V8_FULL_VERSION.jar";

const LINUX_DOCKER_JAVA_HOME: &str = "/opt/jdk/jdk1.8.0_131";
const MACOS_JAVA_HOME: &str = "/Library/Java/JavaVirtualMachines/jdk1.8.0_131.jdk/Contents/Home";

const JNI_CLASS: &str = "com.eclipsesource.v8.V8";

/// Append the step's extra arguments to a tool invocation.
pub fn with_args(cmd: &str, config: &StepConfig) -> String {
  match config.args.as_deref() {
    Some(args) if !args.is_empty() => format!("{cmd} {args}"),
    _ => cmd.to_string(),
  }
}

/// Directory the native library is compiled in.
pub fn cmake_out_dir(config: &StepConfig) -> String {
  match config.target {
    // MSBuild puts the binaries below a per-configuration directory.
    Os::Windows => format!("{CMAKE_OUT_DIR}Release"),
    _ => CMAKE_OUT_DIR.trim_end_matches('/').to_string(),
  }
}

pub fn output_lib_path(config: &StepConfig) -> String {
  format!("{}/{OUTPUT_LIB_NAME}", cmake_out_dir(config))
}

/// A `-D` definition as cmake reads it from the command line.
pub fn cmake_var(name: &str, kind: &str, value: &str) -> String {
  format!(" -D{name}:{kind}={value} ")
}

/// The J2V8 cmake definitions derived from the configuration.
pub fn cmake_vars(config: &StepConfig) -> String {
  let mut vars = String::new();

  if config.cross_agent.is_some() {
    vars.push_str(&cmake_var("J2V8_CROSS_COMPILE", "BOOL", "TRUE"));
  }
  vars.push_str(&cmake_var("J2V8_TARGET_ARCH", "STRING", &config.file_abi));
  if let Some(vendor) = config.vendor() {
    vars.push_str(&cmake_var("J2V8_VENDOR", "STRING", vendor));
  }
  vars.push_str(&cmake_var(
    "J2V8_NODE_ENABLED",
    "BOOL",
    if config.node_enabled { "TRUE" } else { "FALSE" },
  ));

  vars
}

pub fn cmake_toolchain(path: &str) -> String {
  cmake_var("CMAKE_TOOLCHAIN_FILE", "STRING", path)
}

/// Create the cmake output directory, enter it and drop a stale cache.
pub fn enter_clean_cmake_dir(config: &StepConfig) -> Vec<String> {
  let dialect = config.dialect();
  vec![
    dialect.mkdir(CMAKE_OUT_DIR),
    format!("cd {CMAKE_OUT_DIR}"),
    dialect.rm(&["CMakeCache.txt", "CMakeFiles/"]),
  ]
}

/// Point `JAVA_HOME` at the JDK of images that do not define it.
pub fn set_java_home(config: &StepConfig) -> Vec<String> {
  let java_home = match (config.target, config.cross_agent) {
    (Os::Linux, Some(AgentKind::Docker)) if config.vendor() != Some(VENDOR_ALPINE) => LINUX_DOCKER_JAVA_HOME,
    (Os::MacOs, Some(AgentKind::Vagrant)) => MACOS_JAVA_HOME,
    _ => return Vec::new(),
  };
  vec![config.dialect().set_env("JAVA_HOME", java_home)]
}

pub fn set_version_env(config: &StepConfig) -> Vec<String> {
  vec![config.dialect().set_env("J2V8_FULL_VERSION", "$J2V8_FULL_VERSION")]
}

pub fn gradle(config: &StepConfig, task: &str) -> String {
  let program = match config.dialect() {
    Dialect::Windows => "gradlew",
    Dialect::Posix => "gradle",
  };
  format!("{program} {task}")
}

/// Delete native libraries of earlier builds so only this target's ends up
/// in the package.
pub fn clear_native_libs(config: &StepConfig) -> Vec<String> {
  if config.keep_native_libs {
    return Vec::new();
  }

  let pattern = match config.target {
    Os::Android => "src/main/jniLibs/*/libj2v8.so",
    _ => "src/main/resources/libj2v8*",
  };
  vec![config.dialect().rm(&[pattern])]
}

/// Copy the freshly built native library to where the packaging tool picks it up.
pub fn copy_native_libs(config: &StepConfig) -> Vec<String> {
  let dialect = config.dialect();
  let lib = output_lib_path(config);

  match config.target {
    Os::Android => vec![
      dialect.mkdir("src/main/jniLibs/$FILE_ABI"),
      dialect.cp(&lib, "src/main/jniLibs/$FILE_ABI/libj2v8.so"),
    ],
    _ => vec![dialect.cp(&lib, "src/main/resources/")],
  }
}

/// Native library preparation for maven; done by the first Java step of a run only.
pub fn prepare_maven(config: &StepConfig) -> Vec<String> {
  if config.ran_before(Step::J2v8Java) || config.ran_before(Step::J2v8Test) {
    return vec!["echo Native lib already copied...".to_string()];
  }

  let mut cmds = clear_native_libs(config);
  cmds.extend(copy_native_libs(config));
  cmds.extend(set_java_home(config));
  cmds
}

/// Collect the packaged jar in `build.out`.
pub fn copy_output(config: &StepConfig) -> Vec<String> {
  let dialect = config.dialect();
  vec![
    dialect.mkdir("build.out"),
    dialect.cp(&format!("target/{OUTPUT_JAR_NAME}"), "build.out/"),
  ]
}

pub fn build_j2v8_jni(config: &StepConfig) -> Vec<String> {
  let header = JNI_CLASS.replace('.', "_");
  vec![
    "echo Generating JNI header files...".to_string(),
    "cd ./target/classes".to_string(),
    format!("javah {JNI_CLASS}"),
    config
      .dialect()
      .cp(&format!("{header}.h"), &format!("../../jni/{header}Impl.h")),
    "echo Done".to_string(),
  ]
}

pub fn build_j2v8_java(config: &StepConfig) -> Vec<String> {
  let mut cmds = prepare_maven(config);
  cmds.push(with_args(JAVA_BUILD_CMD, config));
  cmds.extend(copy_output(config));
  cmds
}

pub fn build_j2v8_test(config: &StepConfig) -> Vec<String> {
  let mut cmds = prepare_maven(config);
  cmds.push(with_args(JAVA_TESTS_CMD, config));
  cmds
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::Arch;
  use crate::util::testutil::step_config;

  // =====================================================================
  // cmake
  // =====================================================================

  #[test]
  fn cmake_vars_without_cross_agent_or_vendor() {
    let config = step_config(Os::Linux, Arch::X64, |_| {});
    assert_eq!(
      cmake_vars(&config),
      " -DJ2V8_TARGET_ARCH:STRING=x86_64  -DJ2V8_NODE_ENABLED:BOOL=FALSE "
    );
  }

  #[test]
  fn cmake_vars_for_cross_compiled_vendor_build() {
    let config = step_config(Os::Linux, Arch::X86, |b| {
      b.cross_agent(Some(AgentKind::Docker))
        .vendor(Some("debian".to_string()))
        .node_enabled(true);
    });
    assert_eq!(
      cmake_vars(&config),
      " -DJ2V8_CROSS_COMPILE:BOOL=TRUE  -DJ2V8_TARGET_ARCH:STRING=x86_32  -DJ2V8_VENDOR:STRING=debian  -DJ2V8_NODE_ENABLED:BOOL=TRUE "
    );
  }

  // =====================================================================
  // JAVA_HOME
  // =====================================================================

  #[test]
  fn java_home_is_set_inside_linux_docker_images() {
    let config = step_config(Os::Linux, Arch::X64, |b| {
      b.cross_agent(Some(AgentKind::Docker));
    });
    assert_eq!(set_java_home(&config), vec!["export JAVA_HOME=\"/opt/jdk/jdk1.8.0_131\"".to_string()]);
  }

  #[test]
  fn alpine_brings_its_own_java_home() {
    let config = step_config(Os::Linux, Arch::X64, |b| {
      b.cross_agent(Some(AgentKind::Docker)).vendor(Some("alpine".to_string()));
    });
    assert!(set_java_home(&config).is_empty());
  }

  #[test]
  fn host_builds_use_the_system_java_home() {
    let config = step_config(Os::Linux, Arch::X64, |_| {});
    assert!(set_java_home(&config).is_empty());
  }

  // =====================================================================
  // maven preparation
  // =====================================================================

  #[test]
  fn first_java_step_prepares_native_libs() {
    let config = step_config(Os::Linux, Arch::X64, |_| {});
    assert_eq!(
      prepare_maven(&config),
      vec![
        "rm -rf src/main/resources/libj2v8*".to_string(),
        "cp ./cmake.out/$VENDOR-$PLATFORM.$ARCH/libj2v8-$VENDOR-$PLATFORM-$FILE_ABI.$LIB_EXT src/main/resources/"
          .to_string(),
      ]
    );
  }

  #[test]
  fn later_java_step_skips_preparation() {
    let config = step_config(Os::Linux, Arch::X64, |b| {
      b.completed(Step::J2v8Java);
    });
    let cmds = build_j2v8_test(&config);
    assert_eq!(cmds, vec!["echo Native lib already copied...", "mvn test -e --batch-mode"]);
  }

  #[test]
  fn keep_native_libs_skips_clearing() {
    let config = step_config(Os::Linux, Arch::X64, |b| {
      b.keep_native_libs(true);
    });
    let cmds = prepare_maven(&config);
    assert_eq!(cmds.len(), 1);
    assert!(cmds[0].starts_with("cp "));
  }

  #[test]
  fn android_libs_go_to_jni_libs() {
    let config = step_config(Os::Android, Arch::Arm, |_| {});
    let cmds = copy_native_libs(&config);
    assert_eq!(cmds[0], "mkdir -p src/main/jniLibs/$FILE_ABI");
    assert!(cmds[1].ends_with(" src/main/jniLibs/$FILE_ABI/libj2v8.so"));
  }

  #[test]
  fn windows_lib_lives_in_release_dir() {
    let config = step_config(Os::Windows, Arch::X64, |_| {});
    assert_eq!(
      output_lib_path(&config),
      "./cmake.out/$VENDOR-$PLATFORM.$ARCH/Release/libj2v8-$VENDOR-$PLATFORM-$FILE_ABI.$LIB_EXT"
    );
  }

  // =====================================================================
  // packaging
  // =====================================================================

  #[test]
  fn java_build_appends_args_and_copies_jar() {
    let config = step_config(Os::Linux, Arch::X64, |b| {
      b.args(Some("-Pfast".to_string()));
    });
    let cmds = build_j2v8_java(&config);

    assert!(cmds.contains(&"mvn clean verify -e --batch-mode -DskipTests -Pfast".to_string()));
    assert_eq!(
      cmds.last().unwrap(),
      "cp target/j2v8_$VENDOR-$PLATFORM_$FILE_ABI-$J2V8_FULL_VERSION.jar build.out/"
    );
  }

  #[test]
  fn jni_headers_are_copied_into_the_jni_tree() {
    let config = step_config(Os::Linux, Arch::X64, |_| {});
    let cmds = build_j2v8_jni(&config);
    assert_eq!(cmds[2], "javah com.eclipsesource.v8.V8");
    assert_eq!(cmds[3], "cp com_eclipsesource_v8_V8.h ../../jni/com_eclipsesource_v8_V8Impl.h");
  }

  #[test]
  fn jar_name_resolves_per_target() {
    let config = step_config(Os::Linux, Arch::X64, |b| {
      b.vendor(Some("alpine".to_string()));
    });
    assert_eq!(
      config.inject_env(OUTPUT_JAR_NAME).unwrap(),
      "j2v8_alpine-linux_x86_64-4.8.0-SNAPSHOT.jar"
    );
  }
}
