use crate::config::StepConfig;
use crate::consts::CMAKE_OUT_DIR;
use crate::platform::targets::shared;
use crate::platform::{AgentConfig, AgentKind, Arch, Os, Target};
use crate::steps::Step;

pub fn target() -> Target {
  Target::new(Os::MacOs, [Arch::X86, Arch::X64])
    .with_file_abi(Arch::X64, "x86_64")
    .with_file_abi(Arch::X86, "x86_32")
    .with_agent(AgentConfig::new(
      AgentKind::Vagrant,
      "$CWD/vagrant/$PLATFORM",
      "/Users/vagrant/j2v8",
    ))
    .with_step(Step::NodeJs, build_node_js)
    .with_step(Step::J2v8Cmake, build_j2v8_cmake)
    .with_step(Step::J2v8Jni, shared::build_j2v8_jni)
    .with_step(Step::J2v8Cpp, build_j2v8_cpp)
    .with_step(Step::J2v8Java, shared::build_j2v8_java)
    .with_step(Step::J2v8Test, shared::build_j2v8_test)
}

fn build_node_js(_config: &StepConfig) -> Vec<String> {
  vec![
    "cd ./node".to_string(),
    "./configure --without-intl --without-inspector --dest-cpu=$ARCH --without-snapshot --enable-static".to_string(),
    "make -j4".to_string(),
  ]
}

fn build_j2v8_cmake(config: &StepConfig) -> Vec<String> {
  let mut cmds = shared::enter_clean_cmake_dir(config);
  cmds.extend(shared::set_java_home(config));
  cmds.push(format!(
    "cmake -DCMAKE_BUILD_TYPE=Release {} ../../",
    shared::cmake_vars(config)
  ));
  cmds
}

fn build_j2v8_cpp(_config: &StepConfig) -> Vec<String> {
  vec![format!("cd {CMAKE_OUT_DIR}"), "make -j4".to_string()]
}
