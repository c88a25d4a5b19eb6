//! vtoolctl entry point.
//!
//! Drives each vtoold operation from the command line.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vtoold::config::{VtoolConfig, DEFAULT_CONFIG_PATH};
use vtoold::{MacAddress, SystemAction, Vtool, WriteOutcome};

/// Device network identity and attribute tool
#[derive(Parser, Debug)]
#[command(name = "vtoolctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the hardware address stored in firmware
    GetHwaddr {
        #[arg(default_value = "eth0")]
        ifname: String,
    },
    /// Store a hardware address in firmware
    SetHwaddr { ifname: String, hwaddr: MacAddress },
    /// Print the live IPv4 address and netmask
    GetAddress {
        #[arg(default_value = "eth0")]
        ifname: String,
    },
    /// Apply and persist a static IPv4 address
    SetAddress {
        ifname: String,
        ip: Ipv4Addr,
        netmask: Option<Ipv4Addr>,
    },
    /// Print the default gateway
    GetGateway {
        #[arg(default_value = "eth0")]
        ifname: String,
    },
    /// Persist and apply a default gateway
    SetGateway { ifname: String, gateway: Ipv4Addr },
    /// Print a device attribute
    GetAttr { key: String },
    /// Set a device attribute
    SetAttr { key: String, value: String },
    /// Run hard-reset, soft-reset or reboot
    Reset { action: SystemAction },
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn report(outcome: WriteOutcome) -> anyhow::Result<()> {
    println!("live: {}", outcome.live);
    println!("persisted: {}", outcome.persisted);
    outcome.into_result().map_err(Into::into)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = VtoolConfig::load_or_default(&args.config)?;
    let vtool = Vtool::from_config(&config)
        .await
        .context("failed to initialize")?;

    match args.command {
        Cmd::GetHwaddr { ifname } => {
            let id = vtool.network.get_hardware_address(&ifname).await?;
            println!("{}", id.hwaddr);
        }
        Cmd::SetHwaddr { ifname, hwaddr } => {
            report(vtool.network.set_hardware_address(&ifname, &hwaddr).await?)?;
        }
        Cmd::GetAddress { ifname } => {
            let addr = vtool.network.get_address(&ifname).await?;
            println!("{} {}", addr.ip, addr.netmask());
        }
        Cmd::SetAddress {
            ifname,
            ip,
            netmask,
        } => {
            report(vtool.network.set_address(&ifname, ip, netmask).await?)?;
        }
        Cmd::GetGateway { ifname } => {
            println!("{}", vtool.network.get_gateway(&ifname).await?);
        }
        Cmd::SetGateway { ifname, gateway } => {
            report(vtool.network.set_gateway(&ifname, gateway).await?)?;
        }
        Cmd::GetAttr { key } => {
            println!("{}", vtool.device.get_attribute(&key).await?);
        }
        Cmd::SetAttr { key, value } => {
            vtool.device.set_attribute(&key, &value).await?;
        }
        Cmd::Reset { action } => {
            vtool.system.run(action).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vtoolctl: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
