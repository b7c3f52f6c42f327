//! End-to-end scenarios against the public library API.
//!
//! Commands are recorded instead of run, so none of these needs a compiler
//! toolchain, Docker or Vagrant.

mod scenarios;
mod support;
