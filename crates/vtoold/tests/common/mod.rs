//! Shared helpers for vtoold integration tests.

use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use vtool_common::{CommandLine, CommandRunner, ExecResult, VtoolResult};
use vtoold::config::VtoolConfig;
use vtoold::netmask::prefix_from_netmask;
use vtoold::Vtool;

/// Interface the fake kernel knows about.
pub const IFNAME: &str = "eth0";

#[derive(Debug, Default, Clone)]
pub struct KernelState {
    pub address: Option<(Ipv4Addr, u32)>,
    pub default_route: Option<(Ipv4Addr, String)>,
    pub ethaddr: Option<String>,
}

/// Emulates `ip`, `ifconfig` and `fw_*env` against in-memory state.
#[derive(Debug, Default)]
pub struct FakeKernel {
    pub state: Mutex<KernelState>,
    pub commands: Mutex<Vec<String>>,
}

fn exit(code: i32, stdout: &str, stderr: &str) -> ExecResult {
    ExecResult {
        exit_code: code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

impl FakeKernel {
    fn ip(&self, args: &[&str]) -> ExecResult {
        let mut state = self.state.lock().unwrap();
        match args {
            ["-o", "-4", "addr", "show", "dev", dev] if *dev == IFNAME => match state.address {
                Some((ip, prefix)) => exit(
                    0,
                    &format!("2: {dev}    inet {ip}/{prefix} brd 0.0.0.0 scope global {dev}"),
                    "",
                ),
                None => exit(0, "", ""),
            },
            ["-o", "-4", "addr", "show", "dev", dev] => {
                exit(1, "", &format!("Device \"{dev}\" does not exist."))
            }
            ["route", "show"] => {
                let mut lines = Vec::new();
                if let Some((gw, dev)) = &state.default_route {
                    lines.push(format!("default via {gw} dev {dev}  proto static  metric 1024"));
                }
                if let Some((ip, prefix)) = state.address {
                    lines.push(format!("{ip}/{prefix} dev {IFNAME}  proto kernel  scope link"));
                }
                exit(0, &lines.join("\n"), "")
            }
            ["route", "del", "default"] => match state.default_route.take() {
                Some(_) => exit(0, "", ""),
                None => exit(2, "", "RTNETLINK answers: No such process"),
            },
            ["route", "add", "default", "via", gw, "dev", dev] => {
                if state.default_route.is_some() {
                    return exit(2, "", "RTNETLINK answers: File exists");
                }
                state.default_route = Some((gw.parse().unwrap(), dev.to_string()));
                exit(0, "", "")
            }
            _ => exit(1, "", "Command line is not complete."),
        }
    }

    fn ifconfig(&self, args: &[&str]) -> ExecResult {
        let mut state = self.state.lock().unwrap();
        match args {
            [dev, ip, "netmask", mask] if *dev == IFNAME => {
                let prefix = prefix_from_netmask(mask.parse().unwrap()).unwrap();
                state.address = Some((ip.parse().unwrap(), prefix));
                exit(0, "", "")
            }
            [dev, ip] if *dev == IFNAME => {
                state.address = Some((ip.parse().unwrap(), 24));
                exit(0, "", "")
            }
            [dev, ..] => exit(1, "", &format!("{dev}: ERROR while getting interface flags: No such device")),
            [] => exit(1, "", "usage"),
        }
    }

    fn fw(&self, program: &str, args: &[&str]) -> ExecResult {
        let mut state = self.state.lock().unwrap();
        match (program, args) {
            ("fw_printenv", ["ethaddr"]) => match &state.ethaddr {
                Some(mac) => exit(0, &format!("ethaddr={mac}"), ""),
                None => exit(1, "", "## Error: \"ethaddr\" not defined"),
            },
            ("fw_setenv", ["ethaddr", mac]) => {
                state.ethaddr = Some(mac.to_string());
                exit(0, "", "")
            }
            _ => exit(1, "", "unsupported"),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeKernel {
    async fn run(&self, cmd: &CommandLine) -> VtoolResult<ExecResult> {
        self.commands.lock().unwrap().push(cmd.to_string());

        let program = Path::new(&cmd.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let args: Vec<&str> = cmd.args.iter().map(String::as_str).collect();

        Ok(match program {
            "ip" => self.ip(&args),
            "ifconfig" => self.ifconfig(&args),
            "fw_printenv" | "fw_setenv" => self.fw(program, &args),
            _ => exit(0, "", ""),
        })
    }
}

/// A Vtool wired to a fresh SQLite file and a fake kernel.
pub async fn setup() -> (TempDir, Arc<FakeKernel>, Vtool) {
    let dir = tempfile::tempdir().unwrap();

    let mut config = VtoolConfig::default();
    config.store.database_path = dir.path().join("configuration.sqlite3");
    config.store.create_if_missing = true;
    config.store.initialize_schema = true;

    let kernel = Arc::new(FakeKernel::default());
    let vtool = Vtool::with_runner(&config, kernel.clone()).await.unwrap();
    (dir, kernel, vtool)
}
