//! Terminal teleoperation client.
//!
//! Arrow keys drive, space stops, `q`/Esc quits. Input goes through the same
//! sampler and debouncer as the browser page, so the rover sees the same
//! `/drive` traffic: at most one request per 50 ms tick, only on a real
//! change, and a heartbeat every 500 ms.
//!
//! Terminals that cannot report key releases get one synthesized after
//! `--release-ms` without a repeat.
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin teleop --features teleop -- --host 192.168.1.50
//! cargo run --bin teleop --features teleop -- --host 127.0.0.1 --port 8080
//! ```

use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, ClearType},
};

use rs_rover::client::{ArrowKey, CommandDebouncer, DebounceConfig, InputEvent, InputSampler, PadBounds};
use rs_rover::traits::{Clock, StdClock};
use rs_rover::{Config, DriveCommand};

/// Give up on a drive request after this long.
const REQUEST_TIMEOUT_MS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "teleop", about = "Drive the rover from a terminal")]
struct Args {
    /// Rover address
    #[arg(long, default_value = "192.168.4.1")]
    host: String,

    /// Control server port
    #[arg(long, default_value_t = 80)]
    port: u16,

    /// Synthesize a key release after this long without a repeat
    #[arg(long, default_value_t = 600)]
    release_ms: u64,

    /// Heartbeat interval; the default matches the control page
    #[arg(long)]
    heartbeat_ms: Option<u64>,
}

/// `/drive` requests against one rover, sharing a connection pool.
#[derive(Clone)]
struct DriveClient {
    http: reqwest::Client,
    base: String,
}

impl DriveClient {
    fn new(host: &str, port: u16) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()?;
        Ok(Self {
            http,
            base: format!("http://{}:{}", host, port),
        })
    }

    async fn send(&self, cmd: DriveCommand) -> anyhow::Result<reqwest::StatusCode> {
        let url = format!("{}{}", self.base, cmd.path());
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(anyhow::anyhow!("rover answered {}", status))
        }
    }
}

/// Last press time per axis, for terminals without release events.
#[derive(Default)]
struct HeldKeys {
    vertical: Option<(ArrowKey, u64)>,
    horizontal: Option<(ArrowKey, u64)>,
}

impl HeldKeys {
    fn press(&mut self, key: ArrowKey, now_ms: u64) {
        match key {
            ArrowKey::Up | ArrowKey::Down => self.vertical = Some((key, now_ms)),
            ArrowKey::Left | ArrowKey::Right => self.horizontal = Some((key, now_ms)),
        }
    }

    fn release(&mut self, key: ArrowKey) {
        match key {
            ArrowKey::Up | ArrowKey::Down => self.vertical = None,
            ArrowKey::Left | ArrowKey::Right => self.horizontal = None,
        }
    }

    /// Keys whose last press is older than `release_ms`.
    fn expired(&mut self, now_ms: u64, release_ms: u64) -> Vec<ArrowKey> {
        let mut released = Vec::new();
        for slot in [&mut self.vertical, &mut self.horizontal] {
            if let Some((key, pressed)) = *slot {
                if now_ms.saturating_sub(pressed) > release_ms {
                    released.push(key);
                    *slot = None;
                }
            }
        }
        released
    }
}

fn arrow(code: KeyCode) -> Option<ArrowKey> {
    match code {
        KeyCode::Up => Some(ArrowKey::Up),
        KeyCode::Down => Some(ArrowKey::Down),
        KeyCode::Left => Some(ArrowKey::Left),
        KeyCode::Right => Some(ArrowKey::Right),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let client = DriveClient::new(&args.host, args.port)?;

    println!("Driving rover at {}/", client.base);
    println!("Arrows: drive   Space: stop   q/Esc: quit");

    enable_raw_mode()?;
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let result = run_teleop(&client, &args, enhanced).await;

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    println!();

    // Leave the rover stopped whatever happened above.
    send_drive(client, DriveCommand::stop()).await;
    result
}

fn debounce_config(args: &Args) -> DebounceConfig {
    let debounce = Config::default().drive.debounce;
    match args.heartbeat_ms {
        Some(ms) => debounce.with_max_send_delay_ms(ms),
        None => debounce,
    }
}

async fn run_teleop(client: &DriveClient, args: &Args, enhanced: bool) -> anyhow::Result<()> {
    let config = debounce_config(args);
    let tick = Duration::from_millis(config.tick_ms);
    let mut sampler = InputSampler::default();
    let mut debouncer = CommandDebouncer::new(config);
    let mut held = HeldKeys::default();
    // Pointer events never occur in a terminal.
    let bounds = PadBounds::new(0.0, 0.0, 1.0, 1.0);
    let clock = StdClock::new();

    let mut next_tick = clock.now_ms() + tick.as_millis() as u64;
    loop {
        let now = clock.now_ms();
        let wait = Duration::from_millis(next_tick.saturating_sub(now));

        if event::poll(wait)? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                let now = clock.now_ms();
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                match code {
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,
                    KeyCode::Char('c') if pressed && modifiers.contains(KeyModifiers::CONTROL) => {
                        break
                    }
                    KeyCode::Char(' ') if pressed => {
                        for key in [ArrowKey::Up, ArrowKey::Left] {
                            sampler.handle(InputEvent::KeyUp(key), &bounds);
                            held.release(key);
                        }
                    }
                    code => {
                        if let Some(key) = arrow(code) {
                            if pressed {
                                sampler.handle(InputEvent::KeyDown(key), &bounds);
                                held.press(key, now);
                            } else {
                                sampler.handle(InputEvent::KeyUp(key), &bounds);
                                held.release(key);
                            }
                        }
                    }
                }
            }
        }

        let now = clock.now_ms();
        if now < next_tick {
            continue;
        }
        next_tick = now + tick.as_millis() as u64;

        if !enhanced {
            for key in held.expired(now, args.release_ms) {
                sampler.handle(InputEvent::KeyUp(key), &bounds);
            }
        }

        if let Some(cmd) = debouncer.tick(sampler.axes_mut(), now) {
            show(cmd)?;
            tokio::spawn(send_drive(client.clone(), cmd));
        }
    }

    Ok(())
}

fn show(cmd: DriveCommand) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine)
    )?;
    write!(stdout, "forward {:>4}  steer {:>4}", cmd.forward, cmd.steer)?;
    stdout.flush()
}

/// Fire-and-forget `GET /drive`. Failures, including non-2xx answers, are
/// logged and dropped.
async fn send_drive(client: DriveClient, cmd: DriveCommand) {
    match client.send(cmd).await {
        Ok(status) => log::debug!("{} -> {}", cmd, status),
        Err(e) => log::debug!("{} failed: {}", cmd, e),
    }
}
