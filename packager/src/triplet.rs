//! Multiarch triplet computation.
//!
//! Debian installs libraries under `lib/<triplet>` (e.g.
//! `usr/lib/arm-linux-gnueabihf`). On the build host the triplet is read
//! from the C compiler; off the host no compiler for the target is assumed,
//! so the triplet is built from the platform descriptor instead.

use crate::command::{CommandExecutor, Invocation, run_for_stdout};
use crate::error::{PackagerError, Result};
use crate::platform::{CpuArch, OperatingSystem, PlatformDescriptor};

/// Compiler driver queried when the descriptor names none.
const DEFAULT_COMPILER: &str = "cc";

/// Compute the library subdirectory name for `platform`.
///
/// When `platform` is the build host and `force_non_native` is false, the
/// compiler driver (`compiler_id`, or `cc`) is asked for its target with
/// `-dumpmachine`; if that query fails the canonical rule is used. In every
/// other case the canonical rule applies, with the operating system forced
/// to Linux when `force_non_native` is set.
///
/// # Examples
///
/// ```
/// use glib_packager::platform::{CpuArch, OperatingSystem, PlatformDescriptor};
/// use glib_packager::command::SystemCommandExecutor;
/// use glib_packager::triplet::compute_triplet_name;
///
/// let platform = PlatformDescriptor::new(OperatingSystem::Other, CpuArch::Armv7hf);
/// let triplet = compute_triplet_name(&platform, true, &SystemCommandExecutor);
/// assert_eq!(triplet, "arm-linux-gnueabihf");
/// ```
#[must_use]
pub fn compute_triplet_name(
    platform: &PlatformDescriptor,
    force_non_native: bool,
    executor: &dyn CommandExecutor,
) -> String {
    if force_non_native {
        return canonical_triplet(OperatingSystem::Linux, platform.cpu_arch);
    }
    if platform.is_native() {
        match introspect_host_triplet(platform, executor) {
            Ok(triplet) => return triplet,
            Err(err) => log::warn!("toolchain introspection failed, using canonical triplet: {err}"),
        }
    }
    canonical_triplet(platform.operating_system, platform.cpu_arch)
}

/// Ask the compiler driver for its target triplet.
///
/// # Errors
///
/// Returns [`PackagerError::DependencyQuery`] if the driver cannot be run,
/// fails, or prints nothing.
pub fn introspect_host_triplet(
    platform: &PlatformDescriptor,
    executor: &dyn CommandExecutor,
) -> Result<String> {
    let compiler = platform.compiler_id.as_deref().unwrap_or(DEFAULT_COMPILER);
    let invocation = Invocation::new(compiler).arg("-dumpmachine");
    let triplet = run_for_stdout(executor, &invocation)?;
    if triplet.is_empty() {
        return Err(PackagerError::DependencyQuery {
            tool: compiler.to_owned(),
            message: "-dumpmachine printed nothing".to_owned(),
        });
    }
    log::debug!("{compiler} reports target {triplet}");
    Ok(triplet)
}

/// Build the GNU triplet for `os` and `arch` without consulting a toolchain.
///
/// # Examples
///
/// ```
/// use glib_packager::platform::{CpuArch, OperatingSystem};
/// use glib_packager::triplet::canonical_triplet;
///
/// assert_eq!(canonical_triplet(OperatingSystem::Linux, CpuArch::Armv8), "aarch64-linux-gnu");
/// ```
#[must_use]
pub fn canonical_triplet(os: OperatingSystem, arch: CpuArch) -> String {
    format!("{}-{}", machine(os, arch), system(os, arch))
}

fn machine(os: OperatingSystem, arch: CpuArch) -> &'static str {
    match arch {
        CpuArch::X86_64 => "x86_64",
        CpuArch::X86 => match os {
            OperatingSystem::Linux => "x86",
            OperatingSystem::Other => "i686",
        },
        CpuArch::Armv8 => "aarch64",
        CpuArch::Armv7 | CpuArch::Armv7hf => "arm",
        CpuArch::Ppc32 => "powerpc",
        CpuArch::Ppc64le => "powerpc64le",
        CpuArch::S390x => "s390x-ibm",
    }
}

fn system(os: OperatingSystem, arch: CpuArch) -> String {
    match os {
        OperatingSystem::Other => "unknown".to_owned(),
        OperatingSystem::Linux => {
            let mut system = String::from("linux-gnu");
            if matches!(arch, CpuArch::Armv7 | CpuArch::Armv7hf) {
                system.push_str("eabi");
            }
            if arch == CpuArch::Armv7hf {
                system.push_str("hf");
            }
            system
        }
    }
}
