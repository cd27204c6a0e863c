//! Command-line front end: read or set the balance of the default render
//! endpoint.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use stereo_balance::{BalanceCodec, ChannelMap, DeviceRole};

#[derive(Debug, Parser)]
#[command(name = "stereo-balance", version, about = "Left/right balance of the default audio output")]
struct Cli {
    /// Device role whose default render endpoint is used
    #[arg(long, default_value = "multimedia", env = "STEREO_BALANCE_ROLE")]
    role: DeviceRole,

    /// Channel index of the left speaker
    #[arg(long, default_value_t = 0)]
    left: u32,

    /// Channel index of the right speaker
    #[arg(long, default_value_t = 1)]
    right: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current balance (-1 left .. 1 right)
    Get,

    /// Set the balance; values outside -1..1 are clamped
    Set {
        #[arg(allow_hyphen_values = true)]
        balance: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let channels = ChannelMap::new(cli.left, cli.right)
        .ok_or_else(|| anyhow!("left and right must be different channels"))?;
    let codec = BalanceCodec::new(channels);

    run(&cli, codec)
}

#[cfg(windows)]
fn run(cli: &Cli, codec: BalanceCodec) -> Result<()> {
    use anyhow::Context;
    use stereo_balance::{ChannelVolume, ComGuard, DefaultDevice, DeviceEnumerator, VolumeControl};

    let _com = ComGuard::new()?;
    let device = DefaultDevice::with_role(DeviceEnumerator::new()?, cli.role);
    let volume = device
        .volume_endpoint()
        .context("failed to open the default endpoint volume")?;
    let control = Some(VolumeControl::MasterRelative(&volume));

    match cli.command {
        Command::Get => {
            let balance = codec.get_balance(control)?;
            println!("{balance:.3}");
        }
        Command::Set { balance } => {
            codec.set_balance(control, balance)?;
            let map = codec.channel_map();
            tracing::info!(balance, "balance updated");
            println!(
                "left {:.3} right {:.3}",
                volume.channel_volume(map.left())?,
                volume.channel_volume(map.right())?
            );
        }
    }

    Ok(())
}

#[cfg(not(windows))]
fn run(_cli: &Cli, _codec: BalanceCodec) -> Result<()> {
    Err(stereo_balance::BalanceError::PlatformUnsupported.into())
}
