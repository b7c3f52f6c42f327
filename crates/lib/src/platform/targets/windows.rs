use crate::config::StepConfig;
use crate::consts::CMAKE_OUT_DIR;
use crate::platform::targets::shared;
use crate::platform::{AgentConfig, AgentKind, Arch, Os, Target};
use crate::steps::Step;

const CMAKE_GENERATOR: &str = "Visual Studio 14 2015";

pub fn target() -> Target {
  Target::new(Os::Windows, [Arch::X86, Arch::X64])
    .with_file_abi(Arch::X64, "x86_64")
    .with_file_abi(Arch::X86, "x86")
    .with_agent(AgentConfig::new(AgentKind::Docker, "$CWD/docker", "C:/j2v8"))
    .with_agent(AgentConfig::new(AgentKind::Vagrant, "$CWD/vagrant/$PLATFORM", "C:/j2v8"))
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
    "vcbuild.bat release $ARCH static nosnapshot without-intl".to_string(),
  ]
}

fn build_j2v8_cmake(config: &StepConfig) -> Vec<String> {
  let generator = match config.arch {
    Arch::X64 => format!("{CMAKE_GENERATOR} Win64"),
    _ => CMAKE_GENERATOR.to_string(),
  };

  let mut vars = shared::cmake_vars(config);
  // Docker for Windows cannot write PDBs on the mounted volume.
  if config.cross_agent == Some(AgentKind::Docker) {
    vars.push_str(&shared::cmake_var("J2V8_WIN32_PDB_DOCKER_FIX", "BOOL", "TRUE"));
  }

  let mut cmds = shared::enter_clean_cmake_dir(config);
  cmds.push(format!("cmake ../../ -G\"{generator}\" {vars}"));
  cmds
}

fn build_j2v8_cpp(_config: &StepConfig) -> Vec<String> {
  vec![
    format!("cd {CMAKE_OUT_DIR}"),
    "msbuild j2v8.sln /property:Configuration=Release".to_string(),
  ]
}
