//! ps2netcli - PS2 Samba share manager CLI
//!
//! Command-line front end over the libps2net manager: checks and repairs the
//! Samba configuration, manages the PS2 share and its folder, binds the
//! daemons to an interface, and starts/stops the server.

use clap::{Parser, Subcommand};
use libps2net::*;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ps2netcli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PS2 Samba share manager - configure Samba for PlayStation 2 file sharing", long_about = None)]
struct Cli {
    /// Path to the Samba configuration file
    #[arg(long, default_value = SAMBA_CONF_PATH)]
    conf: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show NetBIOS name, share folder, binding and server state
    Status,
    /// Check global settings, the share section and the shared folder
    Check,
    /// Back up smb.conf and repair the [global] section for the PS2
    Fix,
    /// Get or set the NetBIOS name
    Netbios {
        /// New NetBIOS name; prints the current one when omitted
        name: Option<String>,
    },
    /// Manage the PS2 share section
    Share {
        #[command(subcommand)]
        command: ShareCommands,
    },
    /// Create the shared folder and fix its ownership and mode
    Folder,
    /// List interfaces or their IPv4 addresses
    Iface {
        /// Show the IPv4 addresses of this interface instead of the list
        interface: Option<String>,
    },
    /// Manage the interface/IP binding
    Bind {
        #[command(subcommand)]
        command: BindCommands,
    },
    /// Control the smbd/nmbd daemons
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// Watch the transfer speed of the bound interface
    Monitor {
        /// Sampling interval in seconds
        #[arg(long, default_value_t = 1)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum ShareCommands {
    /// Validate the share section against the canonical PS2 block
    Check,
    /// Create the share section, or reset it to the defaults
    Init,
    /// Point the share at an existing folder
    SetFolder { path: PathBuf },
}

#[derive(Subcommand)]
enum BindCommands {
    /// Show the binding state against live OS state
    Show,
    /// Bind the daemons to an interface and an address assigned on it
    Set { interface: String, ip: Ipv4Addr },
    /// Assign a new IPv4 address on an interface, then bind to it
    AddIp {
        interface: String,
        ip: Ipv4Addr,
        #[arg(long, default_value_t = 24)]
        prefix: u8,
    },
    /// Remove the binding
    Erase,
}

#[derive(Subcommand)]
enum ServerCommands {
    Start,
    Stop,
    Restart,
}

fn is_root() -> bool {
    unsafe { libc::getuid() == 0 }
}

fn requires_root(command: &Commands) -> bool {
    match command {
        Commands::Status | Commands::Check | Commands::Iface { .. } | Commands::Monitor { .. } => false,
        Commands::Netbios { name } => name.is_some(),
        Commands::Bind { command } => !matches!(command, BindCommands::Show),
        Commands::Share { command } => !matches!(command, ShareCommands::Check),
        Commands::Fix | Commands::Folder | Commands::Server { .. } => true,
    }
}

/// The OS user the share is created for
///
/// Under sudo this is the invoking user, not root, so the share lands in the
/// right home directory.
fn resolve_share_user() -> ShareUser {
    let name = std::env::var("SUDO_USER")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "root".to_string());
    let uid = std::env::var("SUDO_UID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| unsafe { libc::getuid() });
    let gid = std::env::var("SUDO_GID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| unsafe { libc::getgid() });

    ShareUser { name, uid, gid }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();

    if requires_root(&cli.command) && !is_root() {
        eprintln!("Error: this operation requires root privileges. Run with sudo or as root.");
        process::exit(1);
    }

    let mut manager = match SambaManager::new(&cli.conf) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Status => handle_status(&mut manager).await,
        Commands::Check => handle_check(&mut manager).await,
        Commands::Fix => handle_fix(&mut manager).await,
        Commands::Netbios { name } => handle_netbios(&mut manager, name.as_deref()).await,
        Commands::Share { command } => handle_share(&mut manager, command).await,
        Commands::Folder => handle_folder(&mut manager).await,
        Commands::Iface { interface } => handle_iface(&manager, interface.as_deref()).await,
        Commands::Bind { command } => handle_bind(&mut manager, command).await,
        Commands::Server { command } => handle_server(&mut manager, command).await,
        Commands::Monitor { interval } => handle_monitor(&mut manager, *interval).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn handle_status(manager: &mut SambaManager) -> Ps2NetResult<()> {
    match manager.netbios_name().await {
        Ok(name) => println!("NetBIOS name:  {}", name),
        Err(e) => println!("NetBIOS name:  (unset: {})", e),
    }
    println!("Share name:    {}", manager.share_name());
    match manager.share_folder_path().await {
        Ok(path) => println!("Shared folder: {}", path.display()),
        Err(e) => println!("Shared folder: (unset: {})", e),
    }
    match manager.binding_state().await? {
        BindingState::Bound { interface, ip } => println!("Binding:       {} {}", interface, ip),
        BindingState::Candidate { interface, ip } => {
            println!("Binding:       {} {} (address not assigned on the interface)", interface, ip)
        }
        BindingState::InterfaceOnly { interface } => {
            println!("Binding:       {} (no address)", interface)
        }
        BindingState::Unbound => println!("Binding:       none"),
    }
    println!("Server state:  {}", manager.server_state());
    Ok(())
}

async fn handle_check(manager: &mut SambaManager) -> Ps2NetResult<()> {
    let user = resolve_share_user();

    if manager.check_global_conf().await? {
        println!("[global]: OK");
    } else {
        println!("[global]: needs repair (run 'ps2netcli fix')");
    }

    match manager.check_share_conf(&user).await {
        Ok(()) => println!("[{}]: OK", manager.share_name()),
        Err(e) => println!("[{}]: {}", manager.share_name(), e),
    }

    match manager.share_folder_ok().await {
        Ok(true) => println!("Shared folder: OK"),
        Ok(false) => println!("Shared folder: missing or not writable (run 'ps2netcli folder')"),
        Err(e) => println!("Shared folder: {}", e),
    }

    Ok(())
}

async fn handle_fix(manager: &mut SambaManager) -> Ps2NetResult<()> {
    manager.fix_global_conf().await?;
    println!("[global] repaired; original configuration kept at {}.bak", manager.conf_path().display());
    Ok(())
}

async fn handle_netbios(manager: &mut SambaManager, name: Option<&str>) -> Ps2NetResult<()> {
    match name {
        Some(name) => {
            manager.set_netbios_name(name).await?;
            println!("NetBIOS name set to '{}'", name);
        }
        None => println!("{}", manager.netbios_name().await?),
    }
    Ok(())
}

async fn handle_share(manager: &mut SambaManager, command: &ShareCommands) -> Ps2NetResult<()> {
    let user = resolve_share_user();
    match command {
        ShareCommands::Check => {
            manager.check_share_conf(&user).await?;
            println!("[{}]: OK", manager.share_name());
        }
        ShareCommands::Init => {
            manager.create_default_share_conf(&user).await?;
            println!("[{}] written with default settings", manager.share_name());
        }
        ShareCommands::SetFolder { path } => {
            manager.set_share_folder_path(path).await?;
            println!("Shared folder set to {}", path.display());
        }
    }
    Ok(())
}

async fn handle_folder(manager: &mut SambaManager) -> Ps2NetResult<()> {
    let user = resolve_share_user();
    manager.create_share_folder(&user).await?;
    manager.fix_share_folder_permissions(&user).await?;
    let path = manager.share_folder_path().await?;
    println!("Shared folder ready at {}", path.display());
    Ok(())
}

async fn handle_iface(manager: &SambaManager, interface: Option<&str>) -> Ps2NetResult<()> {
    match interface {
        Some(interface) => {
            for info in manager.ipv4_addresses(interface).await? {
                println!("{}/{} (netmask {})", info.address, info.prefix_len, info.netmask);
            }
        }
        None => {
            for name in manager.list_interfaces().await? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

async fn handle_bind(manager: &mut SambaManager, command: &BindCommands) -> Ps2NetResult<()> {
    match command {
        BindCommands::Show => {
            println!("{:?}", manager.binding_state().await?);
        }
        BindCommands::Set { interface, ip } => {
            manager.set_binding(interface, *ip).await?;
            println!("Bound to {} on {}", ip, interface);
        }
        BindCommands::AddIp { interface, ip, prefix } => {
            manager.assign_address(interface, *ip, *prefix).await?;
            manager.set_binding(interface, *ip).await?;
            println!("Assigned {}/{} and bound to {}", ip, prefix, interface);
        }
        BindCommands::Erase => {
            manager.erase_binding().await?;
            println!("Binding erased");
        }
    }
    Ok(())
}

async fn handle_server(manager: &mut SambaManager, command: &ServerCommands) -> Ps2NetResult<()> {
    match command {
        ServerCommands::Start => {
            manager.start_server().await?;
            println!("Server started");
        }
        ServerCommands::Stop => {
            manager.stop_server().await?;
            println!("Server stopped");
        }
        ServerCommands::Restart => {
            manager.restart_server().await?;
            println!("Server restarted");
        }
    }
    Ok(())
}

async fn handle_monitor(manager: &mut SambaManager, interval: u64) -> Ps2NetResult<()> {
    let interface = match manager.binding_state().await? {
        BindingState::Unbound => {
            return Err(Ps2NetError::InvalidState(
                "No interface configured; set a binding first".to_string(),
            ));
        }
        state => state.interface().map(str::to_string),
    };
    let interface = interface.ok_or_else(|| {
        Ps2NetError::InvalidState("No interface configured; set a binding first".to_string())
    })?;

    let monitor = NetSpeedMonitor::new(interface.clone(), Duration::from_secs(interval.max(1)));
    let mut events = monitor.subscribe();
    monitor.start().await?;
    println!("Monitoring {} (Ctrl-C to stop)", interface);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                monitor.stop().await;
                break;
            }
            event = events.recv() => match event {
                Ok(SpeedEvent::Sample { upload_kbps, download_kbps }) => {
                    println!("up {:>10.1} KB/s   down {:>10.1} KB/s", upload_kbps, download_kbps);
                }
                Ok(SpeedEvent::InterfaceLost { interface }) => {
                    eprintln!("Interface {} disappeared", interface);
                    break;
                }
                Err(_) => break,
            },
        }
    }

    Ok(())
}
