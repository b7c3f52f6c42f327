use crate::config::StepConfig;
use crate::consts::CMAKE_OUT_DIR;
use crate::platform::targets::shared;
use crate::platform::{AgentConfig, AgentKind, Arch, Os, Target};
use crate::steps::Step;

const ANDROID_API: u32 = 21;

pub fn target() -> Target {
  Target::new(Os::Android, [Arch::X86, Arch::Arm, Arch::Arm64, Arch::X86_64])
    .with_file_abi(Arch::Arm, "armeabi-v7a")
    .with_file_abi(Arch::X86, "x86")
    .with_file_abi(Arch::X86_64, "x86_64")
    .with_file_abi(Arch::Arm64, "arm64-v8a")
    .with_agent(AgentConfig::new(AgentKind::Docker, "$CWD/docker", "/j2v8"))
    .with_step(Step::NodeJs, build_node_js)
    .with_step(Step::J2v8Cmake, build_j2v8_cmake)
    .with_step(Step::J2v8Jni, shared::build_j2v8_jni)
    .with_step(Step::J2v8Cpp, build_j2v8_cpp)
    .with_step(Step::J2v8Java, build_j2v8_java)
    .with_step(Step::J2v8Test, build_j2v8_test)
}

/// CPU name the node and V8 build systems use for `arch`.
fn dest_cpu(arch: Arch) -> &'static str {
  match arch {
    Arch::X86_64 => Arch::X64.as_str(),
    other => other.as_str(),
  }
}

fn build_node_js(config: &StepConfig) -> Vec<String> {
  let configure = format!(
    "cd ./node && ./configure --without-intl --cross-compiling --without-inspector --dest-cpu={} \
     --dest-os=$PLATFORM --openssl-no-asm --without-snapshot --enable-static && \
     CFLAGS=-fPIC CXXFLAGS=-fPIC make -j4 > node.build.output 2>&1",
    dest_cpu(config.arch)
  );
  vec![format!(
    "android-gcc-toolchain $ARCH --api {ANDROID_API} --host gcc-lpthread -C sh -c \"{configure}\""
  )]
}

fn build_j2v8_cmake(config: &StepConfig) -> Vec<String> {
  let monolith_dir = format!("{}.{}", config.target, dest_cpu(config.arch));
  let toolchain = shared::cmake_toolchain("$BUILD_CWD/docker/android/android.$ARCH.toolchain.cmake");

  let mut cmds = shared::enter_clean_cmake_dir(config);
  cmds.push(format!(
    "cmake -DJ2V8_MONOLITH_LIB_DIR={monolith_dir} -DCMAKE_BUILD_TYPE=Release {}{toolchain} ../../",
    shared::cmake_vars(config)
  ));
  cmds
}

fn build_j2v8_cpp(_config: &StepConfig) -> Vec<String> {
  vec![format!("cd {CMAKE_OUT_DIR}"), "make -j4".to_string()]
}

fn build_j2v8_java(config: &StepConfig) -> Vec<String> {
  let mut cmds = shared::clear_native_libs(config);
  cmds.extend(shared::copy_native_libs(config));
  cmds.extend(shared::set_version_env(config));
  cmds.push(shared::gradle(config, "clean assembleRelease"));
  cmds
}

/// Runs the instrumentation tests on a connected device or emulator.
fn build_j2v8_test(config: &StepConfig) -> Vec<String> {
  let mut cmds = shared::set_version_env(config);
  cmds.push(shared::with_args(&shared::gradle(config, "spoon"), config));
  cmds
}
