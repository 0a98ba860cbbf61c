use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use uvscan_rs::view::{STATUS_DISCONNECTED, STATUS_SERVER_ERROR};
use uvscan_rs::{
    init_logger, init_logger_with_level, log_info, log_warn, ClientConfig, CoordinatorHandle,
    DashboardClient, Mode, Rgb, ScanView, UvCategory,
};

#[derive(Parser)]
#[command(name = "uvscan")]
#[command(about = "CLI tool for the UV dashboard skin scanner")]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Device WebSocket endpoint (overrides config)
    #[arg(long, global = true)]
    device_url: Option<String>,

    /// Classification endpoint (overrides config)
    #[arg(long, global = true)]
    classify_url: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan and print the result
    Scan {
        /// Seconds to wait for the device socket
        #[arg(long, default_value = "10")]
        connect_timeout: u64,
    },
    /// Interactive session: scan, debug on|off, simulate R G B, quit
    Monitor,
    /// Send a simulated skin color through the backend
    Simulate { r: u8, g: u8, b: u8 },
    /// Show the current UV index
    Uv {
        /// Also print the history
        #[arg(long)]
        history: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        init_logger_with_level("debug");
    } else {
        init_logger();
    }

    let mut config = ClientConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(url) = cli.device_url {
        config.device_url = url;
    }
    if let Some(url) = cli.classify_url {
        config.classify_url = url;
    }

    match cli.command {
        Commands::Scan { connect_timeout } => {
            let client = uvscan_rs::connect(&config)?;
            let handle = client.handle();
            let opened = tokio::time::timeout(
                Duration::from_secs(connect_timeout),
                handle.wait_for(|v| v.connection.is_open()),
            )
            .await;
            if opened.is_err() {
                log_warn("Timed out waiting for the sensor socket");
                client.shutdown().await;
                bail!("sensor at {} did not connect", config.device_url);
            }

            let view = run_scan(&handle).await?;
            print_view(&view);
            client.shutdown().await;
        }
        Commands::Monitor => {
            let client = uvscan_rs::connect(&config)?;
            monitor(client.handle()).await?;
            client.shutdown().await;
        }
        Commands::Simulate { r, g, b } => {
            let client = uvscan_rs::connect(&config)?;
            let handle = client.handle();
            handle.simulate(Rgb::new(r, g, b))?;
            let view = handle
                .wait_for(|v| {
                    v.result.is_some()
                        || v.status.starts_with("Error")
                        || v.status == STATUS_SERVER_ERROR
                })
                .await?;
            print_view(&view);
            client.shutdown().await;
        }
        Commands::Uv { history } => {
            let dashboard = DashboardClient::new(
                &config.uv_current_url,
                &config.uv_history_url,
                config.http_timeout(),
            )?;
            let current = dashboard.fetch_current().await?;
            let category = UvCategory::from_index(current.uv);
            match (current.uv, current.timestamp) {
                (Some(uv), Some(ts)) => println!("UV {uv:.1} ({category}) at {}", ts.to_rfc3339()),
                (Some(uv), None) => println!("UV {uv:.1} ({category})"),
                _ => println!("UV n/a ({category})"),
            }
            if history {
                for sample in dashboard.fetch_history().await? {
                    println!(
                        "{}  {:>5.1}  {}",
                        sample.timestamp.format("%Y-%m-%d %H:%M"),
                        sample.uv,
                        UvCategory::from_index(Some(sample.uv))
                    );
                }
            }
        }
    }

    Ok(())
}

/// Triggers one scan and waits for it to settle.
async fn run_scan(handle: &CoordinatorHandle) -> anyhow::Result<ScanView> {
    handle.trigger_scan()?;
    let started = handle
        .wait_for(|v| !v.trigger_enabled || v.status == STATUS_DISCONNECTED)
        .await?;
    if started.trigger_enabled {
        return Ok(started);
    }
    Ok(handle.wait_for(|v| v.trigger_enabled).await?)
}

async fn monitor(handle: CoordinatorHandle) -> anyhow::Result<()> {
    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let view = updates.borrow_and_update().clone();
            print_view(&view);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["scan"] => handle.trigger_scan()?,
            ["debug", "on"] => handle.set_mode(Mode::Debug)?,
            ["debug", "off"] => handle.set_mode(Mode::Normal)?,
            ["simulate", r, g, b] => {
                let rgb = Rgb::new(r.parse()?, g.parse()?, b.parse()?);
                handle.simulate(rgb)?;
            }
            ["quit"] | ["exit"] => break,
            [] => {}
            _ => eprintln!("commands: scan | debug on | debug off | simulate R G B | quit"),
        }
    }

    printer.abort();
    log_info("Monitor finished");
    Ok(())
}

fn print_view(view: &ScanView) {
    println!(
        "[{:?}{}] {}",
        view.connection,
        if view.mode == Mode::Debug { ", debug" } else { "" },
        view.status
    );
    if let Some(result) = &view.result {
        println!("  Skin type:   {}", result.skin_type);
        println!("  ITA:         {}", result.ita);
        println!("  SPF:         {}", result.spf);
        println!("  Reapply:     {}", result.reapply);
        println!("  {} ({})", result.uv_tip, result.uv_category);
    }
    if let Some(warning) = &view.warning {
        println!("  WARNING: {warning}");
    }
    if let Some(preview) = &view.preview {
        println!("  Preview:     {}", preview.color.css());
    }
    if view.mode == Mode::Debug && !view.debug_log.is_empty() {
        if let Some(preview) = &view.preview {
            println!("  Approx. ITA: {:.1}°", preview.approx_ita);
        }
        println!("{}", view.debug_log);
    }
    if let Some(status) = &view.device_status {
        log::debug!("Device status: {status}");
    }
}
